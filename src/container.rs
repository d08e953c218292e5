use crate::constants::{
    CONTENT_TYPES_PATH, DEFAULT_PRESENTATION_PATH, MIN_SLIDE_ID, OFFICE_DOCUMENT_REL_TYPE,
    PACKAGE_RELS_PATH, P_NAMESPACE, RELS_NAMESPACE, SLIDE_CONTENT_TYPE, SLIDE_REL_TYPE,
};
use crate::parse_rels::{append_relationship, next_rel_id, parse_rels, Relationship};
use crate::parse_xml::{find_child, inner_end, is_element, parse_document, xml_text};
use crate::xml_edit::{apply_splices, escape_attr, qname, Splice};
use crate::{Error, Result, Slide};
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Holds a PowerPoint (pptx) package fully in memory.
///
/// `PptxContainer` keeps every part of the archive in its original order,
/// knows the slide order declared by the presentation part and can register
/// new slides. Nothing touches the disk until [`PptxContainer::save`].
pub struct PptxContainer {
    parts: Vec<(String, Vec<u8>)>,
    presentation_path: String,
    /// Slide part names in presentation order.
    pub slide_paths: Vec<String>,
}

impl PptxContainer {
    /// Opens a PowerPoint pptx file and reads all of its parts into memory.
    ///
    /// # Errors
    ///
    /// Errors are returned on file access problems, on a broken archive, and
    /// when the presentation part or its relationships are missing or malformed.
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(data))
    }

    fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut content = Vec::new();
            file.read_to_end(&mut content)?;
            parts.push((name, content));
        }

        let mut container = Self {
            parts,
            presentation_path: String::new(),
            slide_paths: Vec::new(),
        };
        container.presentation_path = container.find_presentation_path()?;
        container.slide_paths = container.read_slide_order()?;
        debug!(
            presentation = %container.presentation_path,
            slides = container.slide_paths.len(),
            "opened pptx package"
        );
        Ok(container)
    }

    pub fn slide_count(&self) -> usize {
        self.slide_paths.len()
    }

    /// Reads a part of the package by its internal path.
    pub fn read_file_from_archive(&self, path: &str) -> Result<&[u8]> {
        self.parts
            .iter()
            .find(|(name, _)| name == path)
            .map(|(_, data)| data.as_slice())
            .ok_or_else(|| Error::PartNotFound(path.to_string()))
    }

    pub fn has_part(&self, path: &str) -> bool {
        self.parts.iter().any(|(name, _)| name == path)
    }

    /// Replaces the content of a part, adding it when it does not exist yet.
    pub fn write_part(&mut self, path: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(name, _)| name == path) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((path.to_string(), data)),
        }
    }

    /// Loads the slide at the zero-based presentation `index`.
    pub fn load_slide(&self, index: usize) -> Result<Slide> {
        let slide_path = self.slide_paths.get(index).ok_or(Error::SlideNotFound)?;
        let slide_data = self.read_file_from_archive(slide_path)?;
        Slide::parse(slide_data, slide_path.clone())
    }

    /// Writes a (modified) slide back to its part.
    pub fn store_slide(&mut self, slide: Slide) {
        let path = slide.rel_path.clone();
        self.write_part(&path, slide.into_xml().into_bytes());
    }

    /// Constructs the path to the relationships part of a given part.
    ///
    /// For `ppt/slides/slide1.xml` this is `ppt/slides/_rels/slide1.xml.rels`.
    pub fn get_rels_path(part_path: &str) -> String {
        let mut rels_path = part_path.to_string();
        match rels_path.rfind('/') {
            Some(pos) => rels_path.insert_str(pos + 1, "_rels/"),
            None => rels_path.insert_str(0, "_rels/"),
        }
        rels_path.push_str(".rels");
        rels_path
    }

    /// Resolves a relationship target against the part that owns the relationship.
    pub fn resolve_target(source_part: &str, target: &str) -> String {
        if let Some(absolute) = target.strip_prefix('/') {
            return absolute.to_string();
        }
        let mut segments: Vec<&str> = source_part.split('/').collect();
        segments.pop();
        for segment in target.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        segments.join("/")
    }

    /// Inverse of [`PptxContainer::resolve_target`]: the target `to_part` has
    /// when referenced from `from_part`.
    pub fn relative_target(from_part: &str, to_part: &str) -> String {
        let mut from_dir: Vec<&str> = from_part.split('/').collect();
        from_dir.pop();
        let to: Vec<&str> = to_part.split('/').collect();

        let common = from_dir
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a == b)
            .count()
            .min(to.len().saturating_sub(1));

        let mut parts: Vec<&str> = vec![".."; from_dir.len() - common];
        parts.extend(&to[common..]);
        parts.join("/")
    }

    fn find_presentation_path(&self) -> Result<String> {
        let Ok(rels_data) = self.read_file_from_archive(PACKAGE_RELS_PATH) else {
            return Ok(DEFAULT_PRESENTATION_PATH.to_string());
        };
        let path = parse_rels(rels_data)?
            .into_iter()
            .find(|rel| rel.rel_type == OFFICE_DOCUMENT_REL_TYPE)
            .map(|rel| Self::resolve_target("", &rel.target))
            .unwrap_or_else(|| DEFAULT_PRESENTATION_PATH.to_string());
        Ok(path)
    }

    /// Slide parts in the order of `p:sldIdLst`.
    fn read_slide_order(&self) -> Result<Vec<String>> {
        let rels_path = Self::get_rels_path(&self.presentation_path);
        let rels = parse_rels(self.read_file_from_archive(&rels_path)?)?;

        let xml_str = xml_text(self.read_file_from_archive(&self.presentation_path)?)?;
        let doc = parse_document(xml_str)?;
        let root = doc.root_element();

        let Some(sld_id_lst) = find_child(&root, P_NAMESPACE, "sldIdLst") else {
            return Ok(Vec::new());
        };

        let mut slide_paths = Vec::new();
        for sld_id in sld_id_lst.children().filter(|n| is_element(n, P_NAMESPACE, "sldId")) {
            let rid = sld_id
                .attribute((RELS_NAMESPACE, "id"))
                .ok_or(Error::ParseError("<p:sldId> without r:id"))?;
            let rel = rels
                .iter()
                .find(|rel| rel.id == rid)
                .ok_or(Error::ParseError("slide relationship missing from presentation"))?;
            slide_paths.push(Self::resolve_target(&self.presentation_path, &rel.target));
        }
        Ok(slide_paths)
    }

    /// Adds a new slide part right after `after` in the presentation order.
    ///
    /// Registers the part in `[Content_Types].xml`, the presentation
    /// relationships and `p:sldIdLst`. Returns the new part name.
    pub fn add_slide_after(&mut self, after: &str, slide_xml: String, rels_xml: Option<String>) -> Result<String> {
        let position = self
            .slide_paths
            .iter()
            .position(|path| path == after)
            .ok_or(Error::SlideNotFound)?;

        let dir = after.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        let number = self
            .parts
            .iter()
            .filter(|(name, _)| name.rsplit_once('/').map(|(d, _)| d) == Some(dir))
            .filter_map(|(name, _)| Slide::extract_slide_number(name))
            .max()
            .unwrap_or(0)
            + 1;
        let slide_path = format!("{dir}/slide{number}.xml");

        self.write_part(&slide_path, slide_xml.into_bytes());
        if let Some(rels_xml) = rels_xml {
            self.write_part(&Self::get_rels_path(&slide_path), rels_xml.into_bytes());
        }
        self.register_content_type(&slide_path)?;

        let rid = self.relate_slide(&slide_path)?;
        let after_rid = self.slide_rel_id(after)?;
        self.insert_slide_id(&after_rid, &rid)?;

        self.slide_paths.insert(position + 1, slide_path.clone());
        debug!(slide = %slide_path, rid = %rid, "registered new slide");
        Ok(slide_path)
    }

    fn register_content_type(&mut self, part_path: &str) -> Result<()> {
        let part_name = format!("/{part_path}");
        let updated = {
            let xml_str = xml_text(self.read_file_from_archive(CONTENT_TYPES_PATH)?)?;
            let doc = parse_document(xml_str)?;
            let root = doc.root_element();

            let exists = root.children().any(|n| {
                n.tag_name().name() == "Override" && n.attribute("PartName") == Some(part_name.as_str())
            });
            if exists {
                return Ok(());
            }

            let entry = format!(
                r#"<Override PartName="{}" ContentType="{SLIDE_CONTENT_TYPE}"/>"#,
                escape_attr(&part_name)
            );
            let at = inner_end(&root).ok_or(Error::ParseError("empty [Content_Types].xml"))?;
            apply_splices(xml_str, vec![Splice::insert(at, entry)])
        };
        self.write_part(CONTENT_TYPES_PATH, updated.into_bytes());
        Ok(())
    }

    fn relate_slide(&mut self, slide_path: &str) -> Result<String> {
        let rels_path = Self::get_rels_path(&self.presentation_path);
        let (rel, updated) = {
            let rels_data = self.read_file_from_archive(&rels_path)?;
            let rel = Relationship {
                id: next_rel_id(&parse_rels(rels_data)?),
                rel_type: SLIDE_REL_TYPE.to_string(),
                target: Self::relative_target(&self.presentation_path, slide_path),
            };
            let updated = append_relationship(rels_data, &rel)?;
            (rel, updated)
        };
        self.write_part(&rels_path, updated.into_bytes());
        Ok(rel.id)
    }

    fn slide_rel_id(&self, slide_path: &str) -> Result<String> {
        let rels_path = Self::get_rels_path(&self.presentation_path);
        parse_rels(self.read_file_from_archive(&rels_path)?)?
            .into_iter()
            .find(|rel| {
                rel.rel_type == SLIDE_REL_TYPE
                    && Self::resolve_target(&self.presentation_path, &rel.target) == slide_path
            })
            .map(|rel| rel.id)
            .ok_or(Error::SlideNotFound)
    }

    fn insert_slide_id(&mut self, after_rid: &str, rid: &str) -> Result<()> {
        let updated = {
            let xml_str = xml_text(self.read_file_from_archive(&self.presentation_path)?)?;
            let doc = parse_document(xml_str)?;
            let root = doc.root_element();
            let sld_id_lst = find_child(&root, P_NAMESPACE, "sldIdLst")
                .ok_or(Error::ParseError("presentation has no <p:sldIdLst>"))?;

            let slide_ids: Vec<_> = sld_id_lst
                .children()
                .filter(|n| is_element(n, P_NAMESPACE, "sldId"))
                .collect();
            let next_id = slide_ids
                .iter()
                .filter_map(|n| n.attribute("id")?.parse::<u32>().ok())
                .max()
                .unwrap_or(MIN_SLIDE_ID - 1)
                .max(MIN_SLIDE_ID - 1)
                + 1;
            let anchor = slide_ids
                .iter()
                .find(|n| n.attribute((RELS_NAMESPACE, "id")) == Some(after_rid))
                .ok_or(Error::SlideNotFound)?;

            let (r_prefix, r_decl) = match sld_id_lst.lookup_prefix(RELS_NAMESPACE) {
                Some(prefix) => (prefix.to_string(), String::new()),
                None => ("r".to_string(), format!(r#" xmlns:r="{RELS_NAMESPACE}""#)),
            };
            let entry = format!(
                r#"<{}{r_decl} id="{next_id}" {}="{}"/>"#,
                qname(sld_id_lst.lookup_prefix(P_NAMESPACE), "sldId"),
                qname(Some(&r_prefix), "id"),
                escape_attr(rid),
            );
            apply_splices(xml_str, vec![Splice::insert(anchor.range().end, entry)])
        };

        let path = self.presentation_path.clone();
        self.write_part(&path, updated.into_bytes());
        Ok(())
    }

    /// Serializes the package into a new zip archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.parts {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Writes the package to `path` in one go.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
