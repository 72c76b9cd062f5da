//! IRD container decoder (component B).
//!
//! Mirrors the source's gzip-peek/retry loop: try inflating the whole file
//! first, and fall back to the raw bytes when that fails rather than
//! sniffing the gzip member header by hand.

use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::debug;

use crate::error::{PsIrdError, Result};
use crate::reader::ByteReader;

const MAGIC: &[u8; 4] = b"3IRD";

#[derive(Debug, Clone)]
pub struct IrdContainer {
    pub version: u8,
    pub game_id: String,
    pub game_name: String,
    pub update_version: String,
    pub game_version: String,
    pub app_version: String,
    pub header_bytes: Vec<u8>,
    pub footer_bytes: Vec<u8>,
    pub regions: Vec<[u8; 16]>,
    pub file_hashes: Vec<(u64, [u8; 16])>,
}

impl IrdContainer {
    pub fn open(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path).map_err(|source| PsIrdError::LocalIo {
            path: path.to_path_buf(),
            source,
        })?;

        let plain = match inflate_gzip(&raw) {
            Ok(inflated) => {
                debug!("{}: gzip-wrapped, inflated to {} bytes", path.display(), inflated.len());
                inflated
            }
            Err(_) => raw,
        };

        if plain.len() < MAGIC.len() || &plain[..MAGIC.len()] != MAGIC {
            return Err(PsIrdError::InvalidMagic(path.to_path_buf()));
        }

        Self::decode(&plain, path)
    }

    fn decode(buf: &[u8], path: &Path) -> Result<Self> {
        let mut r = ByteReader::new(buf);
        let trunc = || PsIrdError::TruncatedIrd(path.to_path_buf());

        let magic = r.read_bytes(4).map_err(|_| trunc())?;
        if magic != MAGIC {
            return Err(PsIrdError::InvalidMagic(path.to_path_buf()));
        }

        let version = r.read_u8().map_err(|_| trunc())?;
        let game_id = r.read_fixed_string(9).map_err(|_| trunc())?;
        let name_len = r.read_u8().map_err(|_| trunc())? as usize;
        let game_name = String::from_utf8_lossy(r.read_bytes(name_len).map_err(|_| trunc())?).into_owned();
        let update_version = r.read_fixed_string(4).map_err(|_| trunc())?;
        let game_version = r.read_fixed_string(5).map_err(|_| trunc())?;
        let app_version = r.read_fixed_string(5).map_err(|_| trunc())?;

        let hdr_len = r.read_u32_le().map_err(|_| trunc())? as usize;
        let hdr_gz = r.read_bytes(hdr_len).map_err(|_| trunc())?;
        let header_bytes = gunzip(hdr_gz, path)?;

        let ftr_len = r.read_u32_le().map_err(|_| trunc())? as usize;
        let ftr_gz = r.read_bytes(ftr_len).map_err(|_| trunc())?;
        let footer_bytes = gunzip(ftr_gz, path)?;

        let n_regions = r.read_u8().map_err(|_| trunc())? as usize;
        let mut regions = Vec::with_capacity(n_regions);
        for _ in 0..n_regions {
            let bytes = r.read_bytes(16).map_err(|_| trunc())?;
            let mut md5 = [0u8; 16];
            md5.copy_from_slice(bytes);
            regions.push(md5);
        }

        let n_files = r.read_u32_le().map_err(|_| trunc())? as usize;
        let mut file_hashes = Vec::with_capacity(n_files);
        for _ in 0..n_files {
            let sector = r.read_u64_le().map_err(|_| trunc())?;
            let bytes = r.read_bytes(16).map_err(|_| trunc())?;
            let mut md5 = [0u8; 16];
            md5.copy_from_slice(bytes);
            file_hashes.push((sector, md5));
        }

        Ok(Self {
            version,
            game_id,
            game_name,
            update_version,
            game_version,
            app_version,
            header_bytes,
            footer_bytes,
            regions,
            file_hashes,
        })
    }
}

fn inflate_gzip(raw: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(raw);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

fn gunzip(bytes: &[u8], path: &Path) -> Result<Vec<u8>> {
    inflate_gzip(bytes).map_err(|source| PsIrdError::BadCompression(path.to_path_buf(), source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    fn synthesize(header: &[u8], footer: &[u8], regions: &[[u8; 16]], files: &[(u64, [u8; 16])]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.push(1); // version
        buf.extend_from_slice(b"BLES00001".as_ref());
        let name = b"Test Game";
        buf.push(name.len() as u8);
        buf.extend_from_slice(name);
        buf.extend_from_slice(b"0100");
        buf.extend_from_slice(b"01.00");
        buf.extend_from_slice(b"01.00");

        let hdr_gz = gzip(header);
        buf.extend_from_slice(&(hdr_gz.len() as u32).to_le_bytes());
        buf.extend_from_slice(&hdr_gz);

        let ftr_gz = gzip(footer);
        buf.extend_from_slice(&(ftr_gz.len() as u32).to_le_bytes());
        buf.extend_from_slice(&ftr_gz);

        buf.push(regions.len() as u8);
        for r in regions {
            buf.extend_from_slice(r);
        }

        buf.extend_from_slice(&(files.len() as u32).to_le_bytes());
        for (sector, md5) in files {
            buf.extend_from_slice(&sector.to_le_bytes());
            buf.extend_from_slice(md5);
        }
        buf
    }

    #[test]
    fn decodes_an_uncompressed_ird() {
        let plain = synthesize(b"header-blob", b"footer-blob", &[[1u8; 16]], &[(42, [2u8; 16])]);
        let container = IrdContainer::decode(&plain, Path::new("test.ird")).unwrap();
        assert_eq!(container.game_id, "BLES00001");
        assert_eq!(container.game_name, "Test Game");
        assert_eq!(container.header_bytes, b"header-blob");
        assert_eq!(container.footer_bytes, b"footer-blob");
        assert_eq!(container.file_hashes, vec![(42, [2u8; 16])]);
    }

    #[test]
    fn accepts_an_outer_gzip_wrapper() {
        let plain = synthesize(b"h", b"f", &[], &[]);
        let wrapped = gzip(&plain);
        let inflated = inflate_gzip(&wrapped).unwrap();
        assert_eq!(inflated, plain);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut plain = synthesize(b"h", b"f", &[], &[]);
        plain[0] = b'X';
        let err = IrdContainer::decode(&plain, Path::new("test.ird")).unwrap_err();
        assert!(matches!(err, PsIrdError::InvalidMagic(_)));
    }

    #[test]
    fn truncated_file_is_reported() {
        let mut plain = synthesize(b"h", b"f", &[], &[]);
        plain.truncate(10);
        let err = IrdContainer::decode(&plain, Path::new("test.ird")).unwrap_err();
        assert!(matches!(err, PsIrdError::TruncatedIrd(_)));
    }
}
