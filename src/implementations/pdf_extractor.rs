use log::{ debug, info, warn };
use lopdf::Document;

use crate::errors::{ ClauseError, ClauseResult };
use crate::models::document::{ ContractText, RawDocument };
use crate::traits::text_extractor::TextExtractor;

/// PDF text extraction backed by `lopdf`, one page at a time in page order
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfTextExtractor;

impl LopdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn looks_like_pdf(data: &[u8]) -> bool {
        let head = &data[..data.len().min(1024)];
        head.windows(4).any(|w| w == b"%PDF")
    }
}

impl TextExtractor for LopdfTextExtractor {
    fn extract(&self, document: &RawDocument) -> ClauseResult<ContractText> {
        let name = document.name.as_deref().unwrap_or("<upload>");
        info!("Extracting text from {} ({} bytes)", name, document.bytes.len());

        if !Self::looks_like_pdf(&document.bytes) {
            warn!("{} is not a PDF document", name);
            return Err(ClauseError::ExtractionFailed("Not a PDF document".to_string()));
        }

        let pdf = Document::load_mem(&document.bytes).map_err(|e| {
            warn!("Failed to load PDF {}: {}", name, e);
            ClauseError::ExtractionFailed(format!("Failed to load PDF: {}", e))
        })?;

        let pages = pdf.get_pages();
        debug!("{} has {} pages", name, pages.len());
        if pages.is_empty() {
            return Err(ClauseError::ExtractionFailed("Document has no pages".to_string()));
        }

        // get_pages is keyed by page number, so iteration is in reading order
        let page_texts = pages.keys().map(|&page_number| {
            pdf.extract_text(&[page_number]).map_err(|e| {
                ClauseError::ExtractionFailed(
                    format!("Failed to extract text from page {}: {}", page_number, e)
                )
            })
        });

        let text = join_page_texts(page_texts)?;
        info!("Extracted {} characters of text", text.as_str().len());
        Ok(text)
    }
}

/// Concatenate page texts in order.
///
/// Any page error fails the whole document. Text that is empty or whitespace
/// after joining means there was nothing to read, usually a scanned document.
pub fn join_page_texts<I>(pages: I) -> ClauseResult<ContractText>
    where I: IntoIterator<Item = ClauseResult<String>>
{
    let mut full_text = String::new();

    for page in pages {
        let page_text = page?;
        if !full_text.is_empty() && !full_text.ends_with('\n') {
            full_text.push('\n');
        }
        full_text.push_str(&page_text);
    }

    ContractText::new(full_text).ok_or_else(|| {
        ClauseError::ExtractionFailed(
            "No extractable text; the document may be scanned or image-based".to_string()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Content;
    use lopdf::{ dictionary, Object, Stream };

    fn blank_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content = Content { operations: vec![] };
        let content_id = doc.add_object(
            Stream::new(dictionary! {}, content.encode().unwrap())
        );
        let page_id = doc.add_object(
            dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }
        );
        doc.objects.insert(
            pages_id,
            Object::Dictionary(
                dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }
            )
        );
        let catalog_id = doc.add_object(
            dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        }
        );
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn joins_pages_in_order() {
        let text = join_page_texts(vec![Ok("Page one".to_string()), Ok("Page two\n".to_string())]).unwrap();
        assert_eq!(text.as_str(), "Page one\nPage two\n");
    }

    #[test]
    fn whitespace_only_pages_fail_extraction() {
        let result = join_page_texts(vec![Ok("  \n".to_string()), Ok("\t".to_string())]);
        assert!(matches!(result, Err(ClauseError::ExtractionFailed(_))));

        let no_pages = join_page_texts(Vec::<ClauseResult<String>>::new());
        assert!(matches!(no_pages, Err(ClauseError::ExtractionFailed(_))));
    }

    #[test]
    fn page_error_fails_the_document() {
        let result = join_page_texts(vec![
            Ok("Page one".to_string()),
            Err(ClauseError::ExtractionFailed("bad font".to_string()))
        ]);
        assert!(matches!(result, Err(ClauseError::ExtractionFailed(_))));
    }

    #[test]
    fn non_pdf_bytes_fail_extraction() {
        let extractor = LopdfTextExtractor::new();
        let result = extractor.extract(&RawDocument::new(b"Not a PDF file".to_vec()));
        assert!(matches!(result, Err(ClauseError::ExtractionFailed(_))));

        let truncated = extractor.extract(&RawDocument::new(b"%PDF-1.4\n%garbage".to_vec()));
        assert!(matches!(truncated, Err(ClauseError::ExtractionFailed(_))));
    }

    #[test]
    fn image_only_pdf_fails_extraction() {
        let extractor = LopdfTextExtractor::new();
        let result = extractor.extract(&RawDocument::new(blank_pdf()).with_name("scan.pdf"));
        assert!(matches!(result, Err(ClauseError::ExtractionFailed(_))));
    }
}
