use std::path::Path;

use anyhow::Result;

use cvparse_core::CvDocument;

pub fn run(output: Option<&Path>) -> Result<()> {
    super::emit(output, &serde_json::to_string_pretty(&CvDocument::placeholder())?)
}
