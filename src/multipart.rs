use std::collections::BTreeMap;

use tokio::io::AsyncReadExt;

use crate::error::{Error, Result};
use crate::request::FileStream;

/// Field name of the file part in an upload
pub const FILE_FIELD: &str = "file";

/// In-memory `multipart/form-data` body
///
/// Parts are written in the order they are added, each delimited by the
/// form's boundary. [`MultipartForm::finish`] closes the body.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    buffer: Vec<u8>,
}

impl MultipartForm {
    /// Create an empty form with a random boundary
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Create an empty form with a fixed boundary
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            buffer: Vec::new(),
        }
    }

    /// The boundary delimiting parts
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value of the `Content-Type` header for this body
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Append a text field
    pub fn add_field(&mut self, name: &str, value: &str) {
        self.open_part(&format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n",
            escape_quotes(name)
        ));
        self.buffer.extend_from_slice(value.as_bytes());
    }

    /// Append every field of a map, in key order
    pub fn add_fields<'a, I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let sorted: BTreeMap<&String, &String> = fields.into_iter().collect();
        for (name, value) in sorted {
            self.add_field(name, value);
        }
    }

    /// Append a file part, reading `contents` to its end
    ///
    /// The stream is consumed: it is dropped before this returns, whether the
    /// read succeeded or not.
    pub async fn add_file(
        &mut self,
        field: &str,
        file_name: &str,
        mut contents: FileStream,
    ) -> Result<()> {
        self.open_part(&format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n",
            escape_quotes(field),
            escape_quotes(file_name)
        ));
        let read = contents.read_to_end(&mut self.buffer).await;
        drop(contents);
        read.map(|_| ()).map_err(Error::Io)
    }

    /// Close the form and return the encoded body
    pub fn finish(mut self) -> Vec<u8> {
        if !self.buffer.is_empty() {
            self.buffer.extend_from_slice(b"\r\n");
        }
        self.buffer
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.buffer
    }

    fn open_part(&mut self, headers: &str) {
        if !self.buffer.is_empty() {
            self.buffer.extend_from_slice(b"\r\n");
        }
        self.buffer
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.buffer.extend_from_slice(headers.as_bytes());
        self.buffer.extend_from_slice(b"\r\n");
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a random boundary for multipart forms
fn generate_boundary() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_boundary_generation() {
        let form1 = MultipartForm::new();
        let form2 = MultipartForm::new();

        assert_eq!(form1.boundary().len(), 32);
        assert_ne!(form1.boundary(), form2.boundary());
        assert_eq!(
            form1.content_type(),
            format!("multipart/form-data; boundary={}", form1.boundary())
        );
    }

    #[tokio::test]
    async fn test_file_then_fields() {
        let mut form = MultipartForm::with_boundary("XyZ");
        form.add_file(FILE_FIELD, "a.txt", Box::new(&b"0123456789"[..]))
            .await
            .unwrap();
        let mut fields = HashMap::new();
        fields.insert("z".to_string(), "last".to_string());
        fields.insert("note".to_string(), "hi".to_string());
        form.add_fields(&fields);

        let body = String::from_utf8(form.finish()).unwrap();
        assert_eq!(
            body,
            "--XyZ\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
             Content-Type: application/octet-stream\r\n\
             \r\n\
             0123456789\r\n\
             --XyZ\r\n\
             Content-Disposition: form-data; name=\"note\"\r\n\
             \r\n\
             hi\r\n\
             --XyZ\r\n\
             Content-Disposition: form-data; name=\"z\"\r\n\
             \r\n\
             last\r\n\
             --XyZ--\r\n"
        );
    }

    #[test]
    fn test_names_are_escaped() {
        let mut form = MultipartForm::with_boundary("b");
        form.add_field("we\"ird", "v");
        let body = String::from_utf8(form.finish()).unwrap();
        assert!(body.contains("name=\"we\\\"ird\""));
    }

    #[test]
    fn test_empty_form() {
        let form = MultipartForm::with_boundary("b");
        assert_eq!(form.finish(), b"--b--\r\n".to_vec());
    }
}
