//! In-memory fixtures for tests: minimal but well-formed `.docx`/`.pptx` packages and small
//! encoded pictures.

use crate::package::Package;
use crate::xml::escape;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const P_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const PKG_RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const OFFICE_DOC_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// A decodable `width` x `height` RGB PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_fixture(width, height, image::ImageFormat::Png)
}

/// A decodable `width` x `height` RGB JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_fixture(width, height, image::ImageFormat::Jpeg)
}

fn encode_fixture(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let pixels = image::RgbImage::from_pixel(width, height, image::Rgb([30, 90, 160]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(pixels)
        .write_to(&mut out, format)
        .expect("fixture image encodes");
    out.into_inner()
}

/// A `.docx` whose body holds `body_xml` followed by section properties.
pub fn docx_with_body(body_xml: &str) -> Vec<u8> {
    let mut package = Package::new();
    package.set_part(
        "[Content_Types].xml",
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"</Types>"#,
        )
        .as_bytes()
        .to_vec(),
    );
    package.set_part(
        "_rels/.rels",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_RELS_NS}"><Relationship Id="rId1" Type="{OFFICE_DOC_REL}" Target="word/document.xml"/></Relationships>"#
        )
        .into_bytes(),
    );
    package.set_part(
        "word/document.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:body>{body_xml}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#
        )
        .into_bytes(),
    );
    package.to_bytes().expect("fixture package serialises")
}

/// A `.docx` with one single-run paragraph per entry.
pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", escape(p)))
        .collect();
    docx_with_body(&body)
}

/// A `.pptx` with one slide per entry; each slide has one text box holding one paragraph per
/// string. Layout 1 is a title layout, layout 2 is the blank layout.
pub fn pptx_with_slides(slides: &[&[&str]]) -> Vec<u8> {
    build_pptx(slides, true)
}

/// Like [`pptx_with_slides`] but the only layout is a title layout.
pub fn pptx_without_blank_layout(slides: &[&[&str]]) -> Vec<u8> {
    build_pptx(slides, false)
}

fn build_pptx(slides: &[&[&str]], with_blank: bool) -> Vec<u8> {
    let mut package = Package::new();

    let mut overrides = String::from(
        r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
    );
    if with_blank {
        overrides.push_str(r#"<Override PartName="/ppt/slideLayouts/slideLayout2.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#);
    }
    for n in 1..=slides.len() {
        overrides.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        ));
    }
    package.set_part(
        "[Content_Types].xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{overrides}</Types>"#
        )
        .into_bytes(),
    );
    package.set_part(
        "_rels/.rels",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_RELS_NS}"><Relationship Id="rId1" Type="{OFFICE_DOC_REL}" Target="ppt/presentation.xml"/></Relationships>"#
        )
        .into_bytes(),
    );

    // Presentation: rId1 is the master, slides follow.
    let slide_ids: String = (0..slides.len())
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2))
        .collect();
    package.set_part(
        "ppt/presentation.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation xmlns:a="{A_NS}" xmlns:r="{R_NS}" xmlns:p="{P_NS}"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
        )
        .into_bytes(),
    );
    let slide_rels: String = (0..slides.len())
        .map(|i| {
            format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
                i + 2,
                i + 1
            )
        })
        .collect();
    package.set_part(
        "ppt/_rels/presentation.xml.rels",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_RELS_NS}"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>{slide_rels}</Relationships>"#
        )
        .into_bytes(),
    );

    let mut layout_ids = String::from(r#"<p:sldLayoutId id="2147483649" r:id="rId1"/>"#);
    let mut layout_rels = String::from(
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
    );
    if with_blank {
        layout_ids.push_str(r#"<p:sldLayoutId id="2147483650" r:id="rId2"/>"#);
        layout_rels.push_str(r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout2.xml"/>"#);
    }
    package.set_part(
        "ppt/slideMasters/slideMaster1.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldMaster xmlns:a="{A_NS}" xmlns:r="{R_NS}" xmlns:p="{P_NS}"><p:cSld><p:spTree/></p:cSld><p:sldLayoutIdLst>{layout_ids}</p:sldLayoutIdLst></p:sldMaster>"#
        )
        .into_bytes(),
    );
    package.set_part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_RELS_NS}">{layout_rels}</Relationships>"#
        )
        .into_bytes(),
    );

    let mut layouts = vec![("slideLayout1", "title", "Title Slide")];
    if with_blank {
        layouts.push(("slideLayout2", "blank", "Blank"));
    }
    for (file, layout_type, name) in layouts {
        package.set_part(
            &format!("ppt/slideLayouts/{file}.xml"),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldLayout xmlns:a="{A_NS}" xmlns:r="{R_NS}" xmlns:p="{P_NS}" type="{layout_type}"><p:cSld name="{name}"><p:spTree/></p:cSld></p:sldLayout>"#
            )
            .into_bytes(),
        );
        package.set_part(
            &format!("ppt/slideLayouts/_rels/{file}.xml.rels"),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_RELS_NS}"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#
            )
            .into_bytes(),
        );
    }

    for (i, paragraphs) in slides.iter().enumerate() {
        let n = i + 1;
        let body: String = paragraphs
            .iter()
            .map(|p| {
                format!(
                    r#"<a:p><a:r><a:rPr lang="en-GB"/><a:t>{}</a:t></a:r></a:p>"#,
                    escape(p)
                )
            })
            .collect();
        package.set_part(
            &format!("ppt/slides/slide{n}.xml"),
            format!(
                concat!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                    r#"<p:sld xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}"><p:cSld><p:spTree>"#,
                    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#,
                    r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Text {n}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
                    r#"<p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{body}</p:txBody></p:sp>"#,
                    r#"</p:spTree></p:cSld></p:sld>"#,
                ),
                a = A_NS,
                r = R_NS,
                p = P_NS,
                n = n,
                body = body,
            )
            .into_bytes(),
        );
        package.set_part(
            &format!("ppt/slides/_rels/slide{n}.xml.rels"),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{PKG_RELS_NS}"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/></Relationships>"#
            )
            .into_bytes(),
        );
    }

    package.to_bytes().expect("fixture package serialises")
}
