use encoding_rs::Encoding;
use html5ever::serialize::{serialize, SerializeOpts};
use markup5ever_rcdom::{Handle, SerializableHandle};

use crate::error::LingoResult;

/// 序列化文档
///
/// `document_encoding` 为空或无法识别时输出 UTF-8。
pub fn serialize_document(document: &Handle, document_encoding: &str) -> LingoResult<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();

    let serializable: SerializableHandle = document.clone().into();
    serialize(&mut buf, &serializable, SerializeOpts::default())?;

    if !document_encoding.is_empty() {
        if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
            let s: &str = &String::from_utf8_lossy(&buf);
            let (data, _, _) = encoding.encode(s);
            buf = data.to_vec();
        }
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::html_to_dom;

    #[test]
    fn test_round_trip_keeps_text() {
        let dom = html_to_dom("<p>Hello</p>".as_bytes(), "utf-8").unwrap();
        let out = serialize_document(&dom.document, "utf-8").unwrap();
        let html = String::from_utf8(out).unwrap();
        assert!(html.contains("<p>Hello</p>"));
    }
}
