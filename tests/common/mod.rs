//! Shared helpers for integration tests: a tiny synthetic-PDF builder and
//! textual inspectors for the appended update sections.

#![allow(dead_code)]

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assemble a single-revision PDF. Object 1 must be the catalog; the
/// cross-reference table and trailer are generated with correct offsets.
pub struct PdfBuilder {
    objects: Vec<(u32, Vec<u8>)>,
    trailer_extra: String,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            trailer_extra: String::new(),
        }
    }

    pub fn object(mut self, number: u32, body: &str) -> Self {
        self.objects.push((number, body.as_bytes().to_vec()));
        self
    }

    pub fn stream_object(mut self, number: u32, dict: &str, payload: &[u8]) -> Self {
        let mut body = format!("{}\nstream\n", dict).into_bytes();
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\nendstream");
        self.objects.push((number, body));
        self
    }

    pub fn trailer_extra(mut self, extra: &str) -> Self {
        self.trailer_extra = extra.to_string();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::new();
        for (number, body) in &self.objects {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", number).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }
        let xref_at = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", self.objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R {} >>\nstartxref\n{}\n%%EOF\n",
                self.objects.len() + 1,
                self.trailer_extra,
                xref_at
            )
            .as_bytes(),
        );
        out
    }
}

/// A two-page letter-size document with real content streams.
pub fn two_page_letter() -> Vec<u8> {
    PdfBuilder::new()
        .object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(
            2,
            "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /MediaBox [0 0 612 792] >>",
        )
        .object(
            3,
            "<< /Type /Page /Parent 2 0 R /Contents 5 0 R \
             /Resources << /Font << /F1 7 0 R >> >> >>",
        )
        .object(4, "<< /Type /Page /Parent 2 0 R /Contents 6 0 R >>")
        .stream_object(5, "<< /Length 26 >>", b"BT /F1 12 Tf (one) Tj ET\nQ")
        .stream_object(6, "<< /Length 24 >>", b"BT /F1 12 Tf (two) Tj ET")
        .object(
            7,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>",
        )
        .build()
}

/// The integer after the last `startxref` marker.
pub fn startxref_value(bytes: &[u8]) -> u64 {
    let needle = b"startxref";
    let idx = bytes
        .windows(needle.len())
        .rposition(|w| w == needle)
        .expect("no startxref marker");
    let tail = &bytes[idx + needle.len()..];
    let digits: String = tail
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_digit())
        .map(|b| *b as char)
        .collect();
    digits.parse().expect("startxref value")
}

/// Walk the `/Prev` chain starting at the newest cross-reference section
/// and return every visited section offset, newest first.
pub fn trailer_chain(bytes: &[u8]) -> Vec<u64> {
    let mut chain = Vec::new();
    let mut next = Some(startxref_value(bytes));
    while let Some(offset) = next {
        chain.push(offset);
        assert!(chain.len() < 32, "runaway /Prev chain");
        next = prev_of_section(bytes, offset);
    }
    chain
}

fn prev_of_section(bytes: &[u8], offset: u64) -> Option<u64> {
    let section = &bytes[offset as usize..];
    let eof = find(section, b"%%EOF").unwrap_or(section.len());
    let region = &section[..eof];
    let prev_at = find(region, b"/Prev")?;
    let tail = &region[prev_at + 5..];
    let digits: String = tail
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_digit())
        .map(|b| *b as char)
        .collect();
    digits.parse().ok()
}

/// Parse the textual cross-reference section at `offset` into
/// `(subsection start, entries)` pairs.
pub fn parse_xref_section(bytes: &[u8], offset: u64) -> Vec<(u32, Vec<(u64, u16, char)>)> {
    let section = &bytes[offset as usize..];
    let text = String::from_utf8_lossy(section);
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("xref"), "no xref keyword at offset");

    let mut subsections = Vec::new();
    let mut current: Option<(u32, Vec<(u64, u16, char)>)> = None;
    for line in lines {
        let line = line.trim();
        if line.starts_with("trailer") {
            break;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.len() {
            2 => {
                if let Some(done) = current.take() {
                    subsections.push(done);
                }
                current = Some((parts[0].parse().unwrap(), Vec::new()));
            },
            3 => {
                let entry = (
                    parts[0].parse().unwrap(),
                    parts[1].parse().unwrap(),
                    parts[2].chars().next().unwrap(),
                );
                current.as_mut().expect("entry before subsection").1.push(entry);
            },
            _ => panic!("unexpected xref line: {:?}", line),
        }
    }
    if let Some(done) = current.take() {
        subsections.push(done);
    }
    subsections
}

pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
