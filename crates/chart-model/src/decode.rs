// Chart file entry point: bytes -> text -> reader -> Chart

use std::path::Path;

use log::debug;

use crate::error::ChartError;
use crate::model::{Chart, ChartFormat};
use crate::reader::{FormatReader, GridReader, OsuReader};

/// Chart file decoder
pub struct ChartDecoder;

impl ChartDecoder {
    /// Read and resolve a chart, choosing the reader by file extension
    pub fn decode(path: &Path) -> Result<Chart, ChartError> {
        Self::decode_with_randoms(path, &[])
    }

    /// Like [`ChartDecoder::decode`] with fixed `#RANDOM` outcomes for grid charts
    pub fn decode_with_randoms(path: &Path, selected_randoms: &[i32]) -> Result<Chart, ChartError> {
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ChartFormat::from_extension)
            .ok_or_else(|| ChartError::UnsupportedFormat {
                path: path.to_path_buf(),
            })?;
        let raw = std::fs::read(path).map_err(|source| ChartError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let chart = match format {
            ChartFormat::Grid => {
                Self::decode_with_reader(&raw, &GridReader::with_randoms(selected_randoms.to_vec()))
            }
            ChartFormat::Osu => Self::decode_with_reader(&raw, &OsuReader::new()),
        }?;
        debug!(
            "decoded {}: {} notes, {} keys, {:.2}s",
            path.display(),
            chart.notes.len(),
            chart.meta.key_count,
            chart.meta.duration
        );
        Ok(chart)
    }

    /// Decode in-memory chart bytes of a known format
    pub fn decode_bytes(raw: &[u8], format: ChartFormat) -> Result<Chart, ChartError> {
        match format {
            ChartFormat::Grid => Self::decode_with_reader(raw, &GridReader::new()),
            ChartFormat::Osu => Self::decode_with_reader(raw, &OsuReader::new()),
        }
    }

    fn decode_with_reader(raw: &[u8], reader: &dyn FormatReader) -> Result<Chart, ChartError> {
        let content = decode_text(raw);
        let mut chart = reader.read_str(&content)?;
        let (md5, sha256) = compute_hashes(raw);
        chart.meta.md5 = md5;
        chart.meta.sha256 = sha256;
        Ok(chart)
    }
}

/// Decode chart bytes permissively: UTF-8, then Shift_JIS, then EUC-JP,
/// finally lossy Shift_JIS
pub fn decode_text(raw: &[u8]) -> String {
    // Check for UTF-8 BOM
    if let Some(rest) = raw.strip_prefix(b"\xEF\xBB\xBF") {
        return String::from_utf8_lossy(rest).into_owned();
    }

    if let Ok(s) = std::str::from_utf8(raw) {
        return s.to_string();
    }

    let (decoded, _, had_errors) = encoding_rs::SHIFT_JIS.decode(raw);
    if !had_errors {
        return decoded.into_owned();
    }

    let (decoded, _, had_errors) = encoding_rs::EUC_JP.decode(raw);
    if !had_errors {
        return decoded.into_owned();
    }

    let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(raw);
    decoded.into_owned()
}

/// MD5 and SHA-256 of the raw file bytes as lowercase hex
pub fn compute_hashes(raw: &[u8]) -> (String, String) {
    use md5::Md5;
    use sha2::{Digest, Sha256};

    let md5 = format!("{:x}", Md5::digest(raw));
    let sha256 = format!("{:x}", Sha256::digest(raw));
    (md5, sha256)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_decode_text_utf8() {
        assert_eq!(decode_text("#TITLE テスト".as_bytes()), "#TITLE テスト");
    }

    #[test]
    fn test_decode_text_strips_bom() {
        let mut raw = vec![0xEF, 0xBB, 0xBF];
        raw.extend_from_slice(b"#BPM 120");
        assert_eq!(decode_text(&raw), "#BPM 120");
    }

    #[test]
    fn test_decode_text_shift_jis() {
        let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode("#TITLE テスト曲");
        assert_eq!(decode_text(&encoded), "#TITLE テスト曲");
    }

    #[test]
    fn test_decode_text_never_fails() {
        let decoded = decode_text(&[b'#', 0xFF, 0xFF, 0x80]);
        assert!(decoded.starts_with('#'));
    }

    #[test]
    fn test_compute_hashes_known_values() {
        let (md5, sha256) = compute_hashes(b"");
        assert_eq!(md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_decode_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".bme").tempfile().unwrap();
        file.write_all(b"#BPM 120\n#00111:01\n#00211:01\n").unwrap();
        let chart = ChartDecoder::decode(file.path()).unwrap();
        assert_eq!(chart.notes.len(), 2);
        assert_eq!(chart.meta.md5.len(), 32);
        assert_eq!(chart.meta.sha256.len(), 64);
    }

    #[test]
    fn test_decode_missing_file() {
        let err = ChartDecoder::decode(Path::new("/nonexistent/chart.bms")).unwrap_err();
        assert!(matches!(err, ChartError::FileRead { .. }));
    }

    #[test]
    fn test_decode_unsupported_extension() {
        let err = ChartDecoder::decode(Path::new("song.bmson")).unwrap_err();
        assert!(matches!(err, ChartError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_decode_bytes_osu() {
        let chart = ChartDecoder::decode_bytes(
            b"[Difficulty]\nCircleSize:7\n[HitObjects]\n36,192,500,1,0\n",
            ChartFormat::Osu,
        )
        .unwrap();
        assert_eq!(chart.meta.key_count, 7);
        assert_eq!(chart.notes.len(), 1);
    }
}
