//! Result rendering: aligned columns, JSON or XML.

use std::io::Write;

use filesearch_core::{database::SearchResult, Result};
use tabled::{builder::Builder, settings::Style};

use crate::config::OutputFormat;

pub fn render<W: Write>(out: &mut W, results: &[SearchResult], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => render_human(out, results),
        OutputFormat::Json => render_json(out, results),
        OutputFormat::Xml => render_xml(out, results),
    }
}

fn render_human<W: Write>(out: &mut W, results: &[SearchResult]) -> Result<()> {
    let mut builder = Builder::new();
    builder.push_record(["Repository", "Package", "Version", "Arch", "File"]);
    builder.push_record(["---", "---", "---", "---", "---"]);
    for result in results {
        builder.push_record([
            result.repository.as_str(),
            result.package.as_str(),
            &result.display_version(),
            result.arch.as_str(),
            result.path.as_str(),
        ]);
    }
    let table = builder.build().with(Style::blank()).to_string();
    writeln!(out, "{table}")?;
    Ok(())
}

fn render_json<W: Write>(out: &mut W, results: &[SearchResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)
        .map_err(|err| filesearch_core::Error::Custom(err.to_string()))?;
    writeln!(out)?;
    Ok(())
}

fn render_xml<W: Write>(out: &mut W, results: &[SearchResult]) -> Result<()> {
    for result in results {
        writeln!(
            out,
            r#"<result repository="{}" package="{}" arch="{}" epoch="{}" version="{}" release="{}" path="{}"></result>"#,
            escape(&result.repository),
            escape(&result.package),
            escape(&result.arch),
            escape(&result.epoch),
            escape(&result.version),
            escape(&result.release),
            escape(&result.path),
        )?;
    }
    Ok(())
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use filesearch_core::database::SearchResult;

    use super::render;
    use crate::config::OutputFormat;

    fn result() -> SearchResult {
        SearchResult {
            repository: "test".into(),
            package: "zypper-filesearch".into(),
            arch: "x86_64".into(),
            epoch: "".into(),
            version: "0.2.0".into(),
            release: "1.1".into(),
            path: "/usr/share/licenses/zypper-filesearch/LICENSE.txt".into(),
        }
    }

    #[test]
    fn human_output_has_header_and_row() {
        let mut out = Vec::new();
        render(&mut out, &[result()], OutputFormat::Human).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Repository"));
        assert!(text.contains("0.2.0-1.1"));
        assert!(text.contains("/usr/share/licenses/zypper-filesearch/LICENSE.txt"));
    }

    #[test]
    fn json_output_roundtrips() {
        let mut out = Vec::new();
        render(&mut out, &[result()], OutputFormat::Json).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["repository"], "test");
        assert_eq!(parsed[0]["release"], "1.1");
    }

    #[test]
    fn xml_output_escapes_attributes() {
        let mut special = result();
        special.package = r#"a<b"&"#.into();
        let mut out = Vec::new();
        render(&mut out, &[special], OutputFormat::Xml).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("<result "));
        assert!(text.contains(r#"package="a&lt;b&quot;&amp;""#));
    }
}
