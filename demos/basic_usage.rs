use std::error::Error;
use std::time::Duration;

use easyreq::{Cookie, FileUpload, Method, RequestOptions, Requester};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let requester = Requester::new()?;

    println!("=== GET with query parameters ===");

    let response = requester
        .get(
            "https://httpbin.org/get?lang=en",
            RequestOptions::new().param("q", "rust").param("lang", "fr"),
        )
        .await?;
    println!("Status: {}", response.status());
    println!("URL: {}", response.url());

    println!("\n=== POST with a JSON body ===");

    let json_data = serde_json::json!({
        "name": "easyreq",
        "version": "0.1.0",
        "language": "rust"
    });
    let response = requester
        .post("https://httpbin.org/post", RequestOptions::new().json(json_data))
        .await?;
    let body = response.text().await?;
    println!("Response: {}", body.chars().take(300).collect::<String>());

    println!("\n=== Form, basic auth and ajax marker ===");

    let options = RequestOptions::new()
        .data("user", "alice")
        .data("remember", "1")
        .basic_auth("alice", "secret")
        .ajax(true)
        .header("Accept", "application/json")?;
    let response = requester.post("https://httpbin.org/post", options).await?;
    println!("Status: {}", response.status());

    println!("\n=== Multipart upload ===");

    let options = RequestOptions::new()
        .file(FileUpload::new("hello.txt", &b"hello world"[..]))
        .data("description", "greeting");
    let response = requester.post("https://httpbin.org/post", options).await?;
    println!("Status: {}", response.status());

    println!("\n=== Dedicated client ===");

    let options = RequestOptions::new()
        .cookie(Cookie::new("theme", "dark"))
        .dial_timeout(Duration::from_secs(5))
        .disable_compression(true);
    let response = requester
        .perform_request(Method::GET, "https://httpbin.org/cookies", options)
        .await?;
    println!("Cookies: {}", response.text().await?);

    println!("\n=== Session ===");

    let session = requester.session(RequestOptions::new())?;
    session
        .get("https://httpbin.org/cookies/set?visited=yes", RequestOptions::new())
        .await?;
    let response = session
        .get("https://httpbin.org/cookies", RequestOptions::new())
        .await?;
    println!("Session cookies: {}", response.text().await?);

    println!("\n=== Error Handling Example ===");

    match requester
        .get("https://httpbin.org/status/404", RequestOptions::new())
        .await?
        .error_for_status()
    {
        Ok(response) => println!("Unexpected success: {}", response.status()),
        Err(e) => println!("Expected error: {}", e),
    }

    Ok(())
}
