#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

pub fn test_data_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("test_data");
    path.push(filename);
    path
}

pub fn load_test_data(filename: &str) -> Vec<u8> {
    fs::read(test_data_path(filename)).expect("Unable to read test data file")
}

/// A minimal package: the certificate slide, optionally followed by a closing slide.
pub fn template_pptx(with_closing_slide: bool) -> Vec<u8> {
    let mut content_types = String::from_utf8(load_test_data("xml/content_types.xml")).unwrap();
    let mut presentation = String::from_utf8(load_test_data("xml/presentation.xml")).unwrap();
    let mut presentation_rels = String::from_utf8(load_test_data("xml/presentation.xml.rels")).unwrap();

    if with_closing_slide {
        content_types = content_types.replace(
            "</Types>",
            r#"<Override PartName="/ppt/slides/slide2.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/></Types>"#,
        );
        presentation = presentation.replace(
            r#"<p:sldId id="256" r:id="rId2"/>"#,
            r#"<p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId5"/>"#,
        );
        presentation_rels = presentation_rels.replace(
            "</Relationships>",
            r#"<Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/></Relationships>"#,
        );
    }

    let mut parts: Vec<(&str, Vec<u8>)> = vec![
        ("[Content_Types].xml", content_types.into_bytes()),
        ("_rels/.rels", load_test_data("xml/package.rels")),
        ("ppt/presentation.xml", presentation.into_bytes()),
        ("ppt/_rels/presentation.xml.rels", presentation_rels.into_bytes()),
        ("ppt/slides/slide1.xml", load_test_data("xml/slide1.xml")),
        ("ppt/slides/_rels/slide1.xml.rels", load_test_data("xml/slide1.xml.rels")),
        ("ppt/media/image1.png", b"\x89PNG\r\n\x1a\nnot really an image".to_vec()),
        ("ppt/notesSlides/notesSlide1.xml", b"<p:notes/>".to_vec()),
    ];
    if with_closing_slide {
        parts.push(("ppt/slides/slide2.xml", load_test_data("xml/slide2.xml")));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<()>::default();
    for (name, data) in parts {
        writer.start_file(name, options).unwrap();
        writer.write_all(&data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn write_template(dir: &Path, name: &str, with_closing_slide: bool) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, template_pptx(with_closing_slide)).unwrap();
    path
}

/// Reads one part of a zip archive on disk as text.
pub fn read_part(archive: &Path, part: &str) -> String {
    let file = fs::File::open(archive).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(part).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

pub fn part_names(archive: &Path) -> Vec<String> {
    let file = fs::File::open(archive).unwrap();
    let archive = ZipArchive::new(file).unwrap();
    archive.file_names().map(str::to_string).collect()
}
