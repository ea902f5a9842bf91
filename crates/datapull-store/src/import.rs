//! Reading lead files exported by other tools.

use std::path::Path;

use datapull_core::LeadCreate;

use crate::{Error, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Utf8Bom,
    Latin1,
}

impl Encoding {
    const ALL: [Encoding; 3] = [Encoding::Utf8, Encoding::Utf8Bom, Encoding::Latin1];

    fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            Encoding::Utf8Bom => bytes
                .strip_prefix(UTF8_BOM)
                .and_then(|rest| std::str::from_utf8(rest).ok())
                .map(str::to_string),
            // every byte is a valid Latin-1 code point
            Encoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// Reads a JSON array of leads, trying each supported encoding in turn.
pub async fn read_leads_from_json(path: impl AsRef<Path>) -> Result<Vec<LeadCreate>> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    parse_leads(&bytes).map_err(|e| Error::Decode(format!("{}: {}", path.display(), e)))
}

fn parse_leads(bytes: &[u8]) -> std::result::Result<Vec<LeadCreate>, String> {
    for encoding in Encoding::ALL {
        let Some(text) = encoding.decode(bytes) else {
            continue;
        };
        match serde_json::from_str::<Vec<LeadCreate>>(&text) {
            Ok(leads) => {
                tracing::info!("Read {} leads using {:?} encoding", leads.len(), encoding);
                return Ok(leads);
            }
            Err(e) => {
                tracing::warn!("Failed to parse JSON with {:?} encoding: {}", encoding, e);
            }
        }
    }

    Err("unable to read the JSON file with any of the attempted encodings".to_string())
}
