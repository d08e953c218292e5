use crate::constants::{A_NAMESPACE, P_NAMESPACE};
use crate::{Error, Result, Rgb};
use roxmltree::{Document, Node};

/// Decodes an XML part, dropping a leading byte order mark.
///
/// Every offset handed out by this module is relative to the returned text,
/// so splices must be applied to it and not to the raw bytes.
pub fn xml_text(xml_data: &[u8]) -> Result<&str> {
    let xml_str = std::str::from_utf8(xml_data)?;
    Ok(xml_str.trim_start_matches('\u{feff}'))
}

pub fn parse_document(xml_str: &str) -> Result<Document<'_>> {
    Ok(Document::parse(xml_str)?)
}

pub fn is_element(node: &Node, namespace: &str, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == Some(namespace)
}

pub fn find_child<'a, 'input>(node: &Node<'a, 'input>, namespace: &str, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_element(n, namespace, name))
}

/// Offset of the closing tag of `node`, i.e. where a new last child goes.
/// `None` for self-closing elements.
pub fn inner_end(node: &Node) -> Option<usize> {
    let range = node.range();
    let text = &node.document().input_text()[range.clone()];
    if text.ends_with("/>") {
        return None;
    }
    text.rfind("</").map(|pos| range.start + pos)
}

/// Offset right after the start tag of `node`, i.e. where a new first child goes.
pub fn inner_start(node: &Node) -> Option<usize> {
    match node.first_child() {
        Some(child) => Some(child.range().start),
        None => inner_end(node),
    }
}

/// Locates `<p:cSld>/<p:spTree>` of a slide document.
///
/// # Errors
///
/// Returns [`Error::ParseError`] when the slide has no shape tree.
pub fn find_sp_tree<'a, 'input>(doc: &'a Document<'input>) -> Result<Node<'a, 'input>> {
    let root = doc.root_element();

    let c_sld = find_child(&root, P_NAMESPACE, "cSld")
        .ok_or(Error::ParseError("no <p:cSld> element in slide"))?;

    find_child(&c_sld, P_NAMESPACE, "spTree")
        .ok_or(Error::ParseError("no <p:spTree> element in slide"))
}

/// Children of the shape tree that describe the group itself rather than a shape.
pub fn is_tree_structure(node: &Node) -> bool {
    is_element(node, P_NAMESPACE, "nvGrpSpPr")
        || is_element(node, P_NAMESPACE, "grpSpPr")
        || is_element(node, P_NAMESPACE, "extLst")
}

/// Top-level shape elements of a shape tree, in document order.
pub fn shape_nodes<'a, 'input>(sp_tree: &Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    sp_tree
        .children()
        .filter(|n| n.is_element() && !is_tree_structure(n))
}

/// Name of a shape, read from the `cNvPr` of its non-visual properties
/// (`p:nvSpPr`, `p:nvPicPr`, `p:nvGraphicFramePr`, ...).
pub fn shape_name<'a>(shape: &Node<'a, '_>) -> Option<&'a str> {
    let nv_pr = shape.children().find(|n| {
        n.is_element()
            && n.tag_name().namespace() == Some(P_NAMESPACE)
            && n.tag_name().name().starts_with("nv")
            && n.tag_name().name().ends_with("Pr")
    })?;
    find_child(&nv_pr, P_NAMESPACE, "cNvPr")?.attribute("name")
}

/// Only autoshapes (`<p:sp>`) carry a text frame.
pub fn supports_text(shape: &Node) -> bool {
    is_element(shape, P_NAMESPACE, "sp")
}

pub fn first_paragraph<'a, 'input>(tx_body: &Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    find_child(tx_body, A_NAMESPACE, "p")
}

pub fn runs<'a, 'input>(paragraph: &Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    paragraph.children().filter(|n| is_element(n, A_NAMESPACE, "r"))
}

/// The explicit sRGB solid fill of a run (`a:rPr/a:solidFill/a:srgbClr@val`).
///
/// Theme colors, inherited colors and malformed values all yield `None`.
pub fn run_color(run: &Node) -> Option<Rgb> {
    let r_pr = find_child(run, A_NAMESPACE, "rPr")?;
    let fill = find_child(&r_pr, A_NAMESPACE, "solidFill")?;
    let srgb = find_child(&fill, A_NAMESPACE, "srgbClr")?;
    Rgb::from_hex(srgb.attribute("val")?)
}

/// Concatenated text of all runs in a text body, paragraphs joined by `\n`.
pub fn text_body_text(tx_body: &Node) -> String {
    tx_body
        .children()
        .filter(|n| is_element(n, A_NAMESPACE, "p"))
        .map(|p| {
            p.children()
                .filter(|n| is_element(n, A_NAMESPACE, "r") || is_element(n, A_NAMESPACE, "br"))
                .map(|n| {
                    if n.tag_name().name() == "br" {
                        "\n".to_string()
                    } else {
                        find_child(&n, A_NAMESPACE, "t")
                            .and_then(|t| t.text())
                            .unwrap_or_default()
                            .to_string()
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Name"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="en-US"><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill></a:rPr><a:t>TEMPLATE</a:t></a:r></a:p></p:txBody></p:sp><p:pic><p:nvPicPr><p:cNvPr id="3" name="Photo"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr></p:pic></p:spTree></p:cSld></p:sld>"#;

    #[test]
    fn test_shape_names_in_order() {
        let doc = parse_document(SLIDE).unwrap();
        let tree = find_sp_tree(&doc).unwrap();
        let names: Vec<_> = shape_nodes(&tree).filter_map(|n| shape_name(&n)).collect();
        assert_eq!(names, vec!["Name", "Photo"]);
    }

    #[test]
    fn test_text_support_and_color() {
        let doc = parse_document(SLIDE).unwrap();
        let tree = find_sp_tree(&doc).unwrap();
        let shapes: Vec<_> = shape_nodes(&tree).collect();

        assert!(supports_text(&shapes[0]));
        assert!(!supports_text(&shapes[1]));

        let tx_body = find_child(&shapes[0], P_NAMESPACE, "txBody").unwrap();
        let paragraph = first_paragraph(&tx_body).unwrap();
        let run = runs(&paragraph).next().unwrap();
        assert_eq!(run_color(&run), Some(Rgb(255, 0, 0)));
        assert_eq!(text_body_text(&tx_body), "TEMPLATE");
    }

    #[test]
    fn test_scheme_color_is_not_captured() {
        let xml = r#"<a:r xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:rPr><a:solidFill><a:schemeClr val="accent1"/></a:solidFill></a:rPr><a:t>x</a:t></a:r>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(run_color(&doc.root_element()), None);
    }

    #[test]
    fn test_missing_sp_tree_is_an_error() {
        let xml = r#"<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld/></p:sld>"#;
        let doc = parse_document(xml).unwrap();
        assert!(matches!(find_sp_tree(&doc), Err(Error::ParseError(_))));
    }

    #[test]
    fn test_inner_offsets() {
        let xml = "<root><a/>text</root>";
        let doc = parse_document(xml).unwrap();
        let root = doc.root_element();
        assert_eq!(inner_start(&root), Some(6));
        assert_eq!(inner_end(&root), Some(14));

        let leaf = root.first_element_child().unwrap();
        assert_eq!(inner_end(&leaf), None);
    }

    #[test]
    fn test_bom_is_dropped() {
        let bytes = "\u{feff}<root/>".as_bytes();
        assert_eq!(xml_text(bytes).unwrap(), "<root/>");
    }
}
