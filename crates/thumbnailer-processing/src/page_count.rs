//! PDF page counting

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use thumbnailer_core::{PipelineError, PipelineResult};

use crate::tool::ExternalTool;

static PAGES_FIELD: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?m)^Pages:\s+(\d+)\s*$"));

/// Extract the `Pages:` field from the inspector's report
pub fn parse_page_count(report: &str) -> PipelineResult<u32> {
    let pattern = PAGES_FIELD
        .as_ref()
        .map_err(|e| PipelineError::PageCount(e.to_string()))?;
    let captures = pattern
        .captures(report)
        .ok_or_else(|| PipelineError::PageCount("no Pages field in inspector output".to_string()))?;

    captures[1]
        .parse()
        .map_err(|_| PipelineError::PageCount(format!("invalid page count '{}'", &captures[1])))
}

pub struct PageCounter {
    tool: ExternalTool,
}

impl PageCounter {
    pub fn new(tool: ExternalTool) -> Self {
        Self { tool }
    }

    #[tracing::instrument(skip(self), fields(process.executable.name = %self.tool.name()))]
    pub async fn count_pages(&self, path: &Path) -> PipelineResult<u32> {
        let output = self
            .tool
            .output([path.as_os_str()])
            .await
            .map_err(|e| PipelineError::PageCount(e.to_string()))?;

        if !output.status.success() {
            return Err(PipelineError::PageCount(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let pages = parse_page_count(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(pages, "Counted pages");
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::testing::script_tool;

    const REPORT: &str = "Title:          Quarterly\n\
                          Producer:       LibreOffice\n\
                          Pages:          12\n\
                          Encrypted:      no\n";

    #[test]
    fn reads_pages_field() {
        assert_eq!(parse_page_count(REPORT).unwrap(), 12);
        assert_eq!(parse_page_count("Pages: 0\n").unwrap(), 0);
    }

    #[test]
    fn missing_or_malformed_field_is_an_error() {
        assert!(matches!(
            parse_page_count("Title: x\n"),
            Err(PipelineError::PageCount(_))
        ));
        assert!(parse_page_count("Pages: many\n").is_err());
        assert!(parse_page_count("Pages: 99999999999\n").is_err());
    }

    #[tokio::test]
    async fn counts_pages_from_tool_output() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script_tool(dir.path(), "pdfinfo.sh", "printf 'Title: t\\nPages:    7\\n'\n");

        let pages = PageCounter::new(tool).count_pages(Path::new("/tmp/doc")).await.unwrap();
        assert_eq!(pages, 7);
    }

    #[tokio::test]
    async fn tool_failure_is_a_page_count_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script_tool(dir.path(), "pdfinfo.sh", "echo 'Syntax Error: not a PDF' >&2\nexit 1\n");

        let err = PageCounter::new(tool).count_pages(Path::new("/tmp/doc")).await.unwrap_err();
        assert!(matches!(err, PipelineError::PageCount(ref msg) if msg.contains("not a PDF")));
    }
}
