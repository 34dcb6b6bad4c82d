use std::path::Path;

/// The uploaded PDF, consumed once by the text extractor
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub name: Option<String>,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { name: None, bytes }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read a document from disk, keeping the file name for the report
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());
        Ok(Self { name, bytes })
    }
}

/// Full contract text. Never empty or whitespace-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractText(String);

impl ContractText {
    /// Returns `None` when the text carries no content
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for ContractText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
