use crate::constants::{A_NAMESPACE, MC_NAMESPACE, P_NAMESPACE};
use crate::parse_xml::{
    find_child, find_sp_tree, first_paragraph, inner_end, inner_start, is_element, parse_document,
    run_color, runs, shape_name, shape_nodes, supports_text, text_body_text, xml_text,
};
use crate::xml_edit::{apply_splices, escape_attr, escape_text, qname, Splice};
use crate::{Result, Rgb, RowBinding};
use roxmltree::Node;
use tracing::{debug, trace};

/// A slide part held as XML text.
#[derive(Debug, Clone)]
pub struct Slide {
    pub rel_path: String,
    pub slide_number: u32,
    xml: String,
}

/// Read-only view of a top-level shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeInfo {
    pub name: Option<String>,
    /// Local tag name: `sp`, `pic`, `graphicFrame`, `grpSp`, ...
    pub kind: String,
    pub supports_text: bool,
    pub text: Option<String>,
    pub first_run_color: Option<Rgb>,
    /// The shape's markup exactly as it appears in the part.
    pub xml: String,
}

impl Slide {
    /// Wraps slide XML, checking it has a shape tree.
    pub fn parse(xml: &[u8], rel_path: String) -> Result<Slide> {
        let xml = xml_text(xml)?.to_string();
        {
            let doc = parse_document(&xml)?;
            find_sp_tree(&doc)?;
        }
        let slide_number = Self::extract_slide_number(&rel_path).unwrap_or(0);
        Ok(Slide { rel_path, slide_number, xml })
    }

    pub fn extract_slide_number(path: &str) -> Option<u32> {
        path
            .split('/')
            .last()
            .and_then(|filename| {
                filename
                    .strip_prefix("slide")
                    .and_then(|s| s.strip_suffix(".xml"))
            })
            .and_then(|num_str| num_str.parse::<u32>().ok())
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn into_xml(self) -> String {
        self.xml
    }

    pub fn shapes(&self) -> Result<Vec<ShapeInfo>> {
        let doc = parse_document(&self.xml)?;
        let sp_tree = find_sp_tree(&doc)?;

        Ok(shape_nodes(&sp_tree)
            .map(|shape| {
                let tx_body = find_child(&shape, P_NAMESPACE, "txBody");
                let first_run_color = tx_body
                    .as_ref()
                    .and_then(first_paragraph)
                    .and_then(|p| runs(&p).next())
                    .and_then(|r| run_color(&r));
                ShapeInfo {
                    name: shape_name(&shape).map(str::to_string),
                    kind: shape.tag_name().name().to_string(),
                    supports_text: supports_text(&shape),
                    text: tx_body.as_ref().map(text_body_text),
                    first_run_color,
                    xml: self.xml[shape.range()].to_string(),
                }
            })
            .collect())
    }

    /// Writes the bound values into every text shape whose name is a column.
    ///
    /// Returns the number of shapes that received text.
    pub fn fill(&mut self, binding: &RowBinding) -> Result<usize> {
        let mut splices = Vec::new();
        let mut filled = 0;
        {
            let doc = parse_document(&self.xml)?;
            let sp_tree = find_sp_tree(&doc)?;

            for shape in shape_nodes(&sp_tree) {
                let Some(name) = shape_name(&shape) else { continue };
                let Some(value) = binding.get(name) else { continue };
                if !supports_text(&shape) {
                    trace!(shape = name, "column matches a shape without a text frame");
                    continue;
                }

                let text = value.to_text();
                let shape_splices = fill_shape(&shape, &text);
                if !shape_splices.is_empty() {
                    filled += 1;
                }
                splices.extend(shape_splices);
            }
        }

        if !splices.is_empty() {
            self.xml = apply_splices(&self.xml, splices);
        }
        debug!(slide = %self.rel_path, filled, "filled placeholders");
        Ok(filled)
    }

    /// Builds the XML of a new slide that carries copies of this slide's shapes.
    ///
    /// The new slide starts from an empty shape tree, so nothing the layout
    /// would have contributed is present; shapes are copied verbatim and in
    /// order.
    pub fn duplicate_xml(&self) -> Result<String> {
        let doc = parse_document(&self.xml)?;
        let root = doc.root_element();
        let sp_tree = find_sp_tree(&doc)?;

        let shapes: Vec<&str> = shape_nodes(&sp_tree).map(|n| &self.xml[n.range()]).collect();
        let skeleton = slide_skeleton(&root, &sp_tree);
        insert_shapes(&skeleton, &shapes)
    }
}

/// Empty slide using the namespace bindings in scope at the source shape tree.
fn slide_skeleton(root: &Node, sp_tree: &Node) -> String {
    let mut declarations = String::new();
    for ns in sp_tree.namespaces() {
        match ns.name() {
            Some("xml") => continue,
            Some(prefix) => declarations.push_str(&format!(r#" xmlns:{prefix}="{}""#, escape_attr(ns.uri()))),
            None => declarations.push_str(&format!(r#" xmlns="{}""#, escape_attr(ns.uri()))),
        }
    }

    let p_prefix = match sp_tree.lookup_prefix(P_NAMESPACE) {
        Some(prefix) => prefix.to_string(),
        None => {
            declarations.push_str(&format!(r#" xmlns:p="{P_NAMESPACE}""#));
            "p".to_string()
        }
    };
    let a_prefix = match sp_tree.lookup_prefix(A_NAMESPACE) {
        Some(prefix) => prefix.to_string(),
        None => {
            declarations.push_str(&format!(r#" xmlns:a="{A_NAMESPACE}""#));
            "a".to_string()
        }
    };

    // keeps mc:Ignorable so copied extension markup stays valid
    for attr in root.attributes().filter(|attr| attr.namespace() == Some(MC_NAMESPACE)) {
        let prefix = root.lookup_prefix(MC_NAMESPACE);
        declarations.push_str(&format!(
            r#" {}="{}""#,
            qname(prefix, attr.name()),
            escape_attr(attr.value())
        ));
    }

    let p = |local: &str| qname(Some(&p_prefix), local);
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n<{sld}{decls}><{csld}><{tree}>",
            r#"<{nvgrp}><{cnvpr} id="1" name=""/><{cnvgrp}/><{nvpr}/></{nvgrp}><{grpsppr}/>"#,
            "</{tree}></{csld}><{clr}><{mapping}/></{clr}></{sld}>"
        ),
        sld = p("sld"),
        decls = declarations,
        csld = p("cSld"),
        tree = p("spTree"),
        nvgrp = p("nvGrpSpPr"),
        cnvpr = p("cNvPr"),
        cnvgrp = p("cNvGrpSpPr"),
        nvpr = p("nvPr"),
        grpsppr = p("grpSpPr"),
        clr = p("clrMapOvr"),
        mapping = qname(Some(&a_prefix), "masterClrMapping"),
    )
}

/// Inserts shape markup at the end of the shape tree, ahead of its `p:extLst`.
fn insert_shapes(slide_xml: &str, shapes: &[&str]) -> Result<String> {
    let doc = parse_document(slide_xml)?;
    let sp_tree = find_sp_tree(&doc)?;

    let at = match find_child(&sp_tree, P_NAMESPACE, "extLst") {
        Some(ext_lst) => ext_lst.range().start,
        None => inner_end(&sp_tree)
            .ok_or(crate::Error::ParseError("shape tree is missing its group properties"))?,
    };
    Ok(apply_splices(slide_xml, vec![Splice::insert(at, shapes.concat())]))
}

/// Splices that put `text` into a text shape.
fn fill_shape(shape: &Node, text: &str) -> Vec<Splice> {
    let a = shape.lookup_prefix(A_NAMESPACE);
    let a_decl = if a.is_none() { format!(r#" xmlns:a="{A_NAMESPACE}""#) } else { String::new() };
    let a = a.or(Some("a"));

    let Some(tx_body) = find_child(shape, P_NAMESPACE, "txBody") else {
        return vec![new_text_body(shape, text, a, &a_decl)];
    };
    let Some(paragraph) = first_paragraph(&tx_body) else {
        return Vec::new();
    };

    match runs(&paragraph).next() {
        Some(run) => {
            let color = run_color(&run);
            let mut splices = vec![set_run_text(&run, text, a)];
            if let Some(color) = color {
                splices.extend(color_splice(&run, color, a));
            }
            splices
        }
        None => set_paragraph_text(&paragraph, text, a),
    }
}

fn text_element(text: &str, a: Option<&str>) -> String {
    let t = qname(a, "t");
    format!("<{t}>{}</{t}>", escape_text(text))
}

/// Runs and breaks for `text`, one run per line.
fn paragraph_content(text: &str, a: Option<&str>) -> String {
    let r = qname(a, "r");
    let mut out = String::new();
    for (idx, line) in text.split(['\n', '\u{b}']).enumerate() {
        if idx > 0 {
            out.push_str(&format!("<{}/>", qname(a, "br")));
        }
        if !line.is_empty() {
            out.push_str(&format!("<{r}>{}</{r}>", text_element(line, a)));
        }
    }
    out
}

fn set_run_text(run: &Node, text: &str, a: Option<&str>) -> Splice {
    match find_child(run, A_NAMESPACE, "t") {
        Some(t) => Splice::replace(t.range(), text_element(text, a)),
        None => match inner_end(run) {
            Some(at) => Splice::insert(at, text_element(text, a)),
            None => {
                let r = qname(a, "r");
                Splice::replace(run.range(), format!("<{r}>{}</{r}>", text_element(text, a)))
            }
        },
    }
}

/// Replaces the content of a run-less paragraph, keeping `a:pPr` and `a:endParaRPr`.
fn set_paragraph_text(paragraph: &Node, text: &str, a: Option<&str>) -> Vec<Splice> {
    let content = paragraph_content(text, a);

    let Some(close) = inner_end(paragraph) else {
        let range = paragraph.range();
        let source = paragraph.document().input_text();
        let open = source[range.start..range.end - 2].trim_end();
        let p = qname(a, "p");
        return vec![Splice::replace(range, format!("{open}>{content}</{p}>"))];
    };

    let mut splices: Vec<Splice> = paragraph
        .children()
        .filter(|n| is_element(n, A_NAMESPACE, "br") || is_element(n, A_NAMESPACE, "fld"))
        .map(|n| Splice::replace(n.range(), ""))
        .collect();

    let at = find_child(paragraph, A_NAMESPACE, "endParaRPr")
        .map(|n| n.range().start)
        .unwrap_or(close);
    splices.push(Splice::insert(at, content));
    splices
}

/// Adds a text body to a shape that has none.
fn new_text_body(shape: &Node, text: &str, a: Option<&str>, a_decl: &str) -> Splice {
    let p = shape.lookup_prefix(P_NAMESPACE);
    let tx_body = qname(p, "txBody");
    let body = format!(
        "<{tx_body}{a_decl}><{}/><{}/><{para}>{}</{para}></{tx_body}>",
        qname(a, "bodyPr"),
        qname(a, "lstStyle"),
        paragraph_content(text, a),
        para = qname(a, "p"),
    );

    let at = find_child(shape, P_NAMESPACE, "extLst")
        .map(|n| n.range().start)
        .or_else(|| inner_end(shape))
        .unwrap_or_else(|| shape.range().end);
    Splice::insert(at, body)
}

const FILL_ELEMENTS: &[&str] = &["noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill"];

/// Splice that gives `run` the solid sRGB color `color`, or `None` when the run
/// already carries exactly that color.
///
/// [`Slide::fill`] only rewrites `a:t`, so reapplying the color it captured is
/// normally a no-op. The call guards the color against a text edit that would
/// also touch `a:rPr`.
pub(crate) fn color_splice(run: &Node, color: Rgb, a: Option<&str>) -> Option<Splice> {
    let hex = color.to_hex();
    let fill = format!(
        r#"<{solid}><{srgb} val="{hex}"/></{solid}>"#,
        solid = qname(a, "solidFill"),
        srgb = qname(a, "srgbClr"),
    );

    let Some(r_pr) = find_child(run, A_NAMESPACE, "rPr") else {
        let r_pr = qname(a, "rPr");
        let at = inner_start(run)?;
        return Some(Splice::insert(at, format!("<{r_pr}>{fill}</{r_pr}>")));
    };

    if run_color(run) == Some(color) {
        return None;
    }

    let Some(close) = inner_end(&r_pr) else {
        let range = r_pr.range();
        let source = r_pr.document().input_text();
        let open = source[range.start..range.end - 2].trim_end();
        return Some(Splice::replace(range, format!("{open}>{fill}</{}>", qname(a, "rPr"))));
    };

    let existing = r_pr.children().find(|n| {
        n.is_element()
            && n.tag_name().namespace() == Some(A_NAMESPACE)
            && FILL_ELEMENTS.contains(&n.tag_name().name())
    });
    if let Some(existing) = existing {
        return Some(Splice::replace(existing.range(), fill));
    }

    let at = match find_child(&r_pr, A_NAMESPACE, "ln") {
        Some(ln) => ln.range().end,
        None => inner_start(&r_pr).unwrap_or(close),
    };
    Some(Splice::insert(at, fill))
}
