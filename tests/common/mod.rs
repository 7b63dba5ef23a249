use std::fs;
use std::path::Path;

/// Minimal BMP with the given pixel dimensions, enough for header sniffing.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size.min(1 << 16) as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.resize(54, 0);
    bytes
}

/// Minimal PNG (signature plus IHDR) with the given pixel dimensions.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(33);
    bytes.extend_from_slice(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    // bit depth, color type, compression, filter, interlace
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    // CRC is not verified by header sniffers
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes
}

pub fn write_file(path: &Path, content: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, content).expect("write fixture file");
}

/// An ALTO v2 page in the shape of a Transkribus export, with one
/// `ComposedBlock`, a single-token baseline, and comma-separated polygon
/// points.
pub fn transkribus_alto_v2() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<alto xmlns="http://www.loc.gov/standards/alto/ns-v2#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.loc.gov/standards/alto/ns-v2# http://www.loc.gov/standards/alto/v2/alto.xsd">
  <Description>
    <MeasurementUnit>pixel</MeasurementUnit>
  </Description>
  <Layout>
    <Page WIDTH="2500" HEIGHT="3500">
      <PrintSpace>
        <ComposedBlock ID="cb_1">
          <TextBlock ID="tb_1">
            <TextLine BASELINE="1097" HEIGHT="179" HPOS="487" ID="tl_2" VPOS="918" WIDTH="2404">
              <String CONTENT="UNIVERSEL." HEIGHT="179" HPOS="487" ID="string_tl_2" VPOS="918" WIDTH="2404"/>
            </TextLine>
            <Shape>
              <Polygon POINTS="1,2 3,4"/>
            </Shape>
          </TextBlock>
        </ComposedBlock>
      </PrintSpace>
    </Page>
  </Layout>
</alto>
"#
    .to_string()
}

/// A METS manifest referencing the given image files in its IMG file group.
pub fn mets_manifest(images: &[&str]) -> String {
    let mut files = String::new();
    for (index, image) in images.iter().enumerate() {
        files.push_str(&format!(
            "      <ns3:file ID=\"IMG_{0}\"><ns3:FLocat ns2:href=\"{1}\"/></ns3:file>\n",
            index + 1,
            image
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ns3:mets xmlns:ns2="http://www.w3.org/1999/xlink" xmlns:ns3="http://www.loc.gov/METS/">
  <ns3:fileSec>
    <ns3:fileGrp ID="IMG">
{files}    </ns3:fileGrp>
  </ns3:fileSec>
</ns3:mets>
"#
    )
}

/// A LIMB/pdfalto style ALTO page: default namespace only, an existing
/// `sourceImageInformation/fileName`, and a 1000x1000 declared canvas.
pub fn measured_alto(ns: &str, canvas_element: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<alto xmlns="{ns}">
  <Description>
    <MeasurementUnit>pixel</MeasurementUnit>
    <sourceImageInformation>
      <fileName>placeholder</fileName>
    </sourceImageInformation>
  </Description>
  <Layout>
    <Page WIDTH="1000" HEIGHT="1000">
      <PrintSpace HPOS="0" VPOS="0" WIDTH="1000" HEIGHT="1000">
        {canvas_element}
        <TextBlock HPOS="100" VPOS="100" WIDTH="200" HEIGHT="50">
          <TextLine HPOS="100" VPOS="110" WIDTH="200" HEIGHT="30">
            <String CONTENT="hello" HPOS="100" VPOS="110" WIDTH="80" HEIGHT="30"/>
            <SP HPOS="180" VPOS="110" WIDTH="10"/>
          </TextLine>
        </TextBlock>
      </PrintSpace>
    </Page>
  </Layout>
</alto>
"#
    )
}
