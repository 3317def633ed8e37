//! Inline image paragraph builder.

use crate::tree::Element;
use crate::tree::wml::{PARAGRAPH, RUN};

const DRAWINGML_MAIN: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const DRAWINGML_PICTURE: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const ZERO_RSID: &str = "00000000";
/// Distance between the inline anchor and surrounding text, in EMUs
const WRAP_DISTANCE: &str = "114300";

fn leaf(name: &str, attributes: &[(&str, &str)]) -> Element {
    attributes
        .iter()
        .fold(Element::new(name), |e, (k, v)| e.with_attr(*k, *v))
}

fn border(name: &str) -> Element {
    leaf(name, &[("w:space", "0"), ("w:sz", "0"), ("w:val", "nil")])
}

fn zero_rect(name: &str) -> Element {
    leaf(name, &[("b", "0"), ("l", "0"), ("r", "0"), ("t", "0")])
}

/// Paragraph properties of an image paragraph: no borders, no spacing, no
/// indentation, left aligned.
fn image_paragraph_properties() -> Element {
    Element::new("w:pPr")
        .with_child(leaf("w:keepNext", &[("w:val", "0")]))
        .with_child(leaf("w:keepLines", &[("w:val", "0")]))
        .with_child(leaf("w:widowControl", &[("w:val", "0")]))
        .with_child(
            ["w:top", "w:left", "w:bottom", "w:right", "w:between"]
                .into_iter()
                .fold(Element::new("w:pBdr"), |b, side| b.with_child(border(side))),
        )
        .with_child(leaf("w:shd", &[("w:fill", "auto"), ("w:val", "clear")]))
        .with_child(leaf(
            "w:spacing",
            &[
                ("w:after", "0"),
                ("w:before", "0"),
                ("w:line", "240"),
                ("w:lineRule", "auto"),
            ],
        ))
        .with_child(leaf(
            "w:ind",
            &[("w:left", "0"), ("w:right", "0"), ("w:firstLine", "0")],
        ))
        .with_child(leaf("w:jc", &[("w:val", "left")]))
        .with_child(Element::new("w:rPr"))
}

fn picture(image_id: &str, name: &str, r_id: &str, cx: &str, cy: &str) -> Element {
    Element::new("pic:pic")
        .with_attr("xmlns:pic", DRAWINGML_PICTURE)
        .with_child(
            Element::new("pic:nvPicPr")
                .with_child(leaf("pic:cNvPr", &[("id", image_id), ("name", name)]))
                .with_child(leaf("pic:cNvPicPr", &[("preferRelativeResize", "0")])),
        )
        .with_child(
            Element::new("pic:blipFill")
                .with_child(leaf("a:blip", &[("r:embed", r_id)]))
                .with_child(zero_rect("a:srcRect"))
                .with_child(Element::new("a:stretch").with_child(Element::new("a:fillRect"))),
        )
        .with_child(
            Element::new("pic:spPr")
                .with_child(
                    Element::new("a:xfrm")
                        .with_child(leaf("a:off", &[("x", "0"), ("y", "0")]))
                        .with_child(leaf("a:ext", &[("cx", cx), ("cy", cy)])),
                )
                .with_child(leaf("a:prstGeom", &[("prst", "rect")]))
                .with_child(Element::new("a:ln")),
        )
}

/// Build the paragraph that anchors image `image_id` inline.
///
/// The picture is named `image{image_id}.png`, embeds relationship `r_id`
/// and is drawn `width` by `height` EMUs.
pub fn build_image_paragraph(image_id: usize, r_id: &str, width: i64, height: i64) -> Element {
    let mut buf = itoa::Buffer::new();
    let id = buf.format(image_id).to_string();
    let name = format!("image{}.png", id);
    let cx = buf.format(width).to_string();
    let cy = buf.format(height).to_string();

    let inline = Element::new("wp:inline")
        .with_attr("distB", WRAP_DISTANCE)
        .with_attr("distT", WRAP_DISTANCE)
        .with_attr("distL", WRAP_DISTANCE)
        .with_attr("distR", WRAP_DISTANCE)
        .with_child(leaf("wp:extent", &[("cx", cx.as_str()), ("cy", cy.as_str())]))
        .with_child(zero_rect("wp:effectExtent"))
        .with_child(leaf("wp:docPr", &[("id", id.as_str()), ("name", name.as_str())]))
        .with_child(
            Element::new("a:graphic")
                .with_attr("xmlns:a", DRAWINGML_MAIN)
                .with_child(
                    Element::new("a:graphicData")
                        .with_attr("uri", DRAWINGML_PICTURE)
                        .with_child(picture(&id, &name, r_id, &cx, &cy)),
                ),
        );

    let run = Element::new(RUN)
        .with_attr("w:rsidDel", ZERO_RSID)
        .with_attr("w:rsidR", ZERO_RSID)
        .with_attr("w:rsidRPr", ZERO_RSID)
        .with_child(Element::new("w:rPr"))
        .with_child(Element::new("w:drawing").with_child(inline));

    Element::new(PARAGRAPH)
        .with_attr("w:rsidR", ZERO_RSID)
        .with_attr("w:rsidDel", ZERO_RSID)
        .with_attr("w:rsidP", ZERO_RSID)
        .with_attr("w:rsidRDefault", ZERO_RSID)
        .with_attr("w:rsidRPr", ZERO_RSID)
        .with_attr("w14:paraId", "00000002")
        .with_child(image_paragraph_properties())
        .with_child(run)
}
