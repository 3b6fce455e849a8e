use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::PathBuf;

use hmac::{Hmac, Mac};
use log::warn;
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};
use sha2::Sha256;

use crate::error::AscError;

type HmacSha256 = Hmac<Sha256>;

// Static namespacing key; the derived directory name is what keeps two
// identities from ever sharing cookie state on disk.
const NAMESPACE_KEY: &[u8] = b"/B?E(H+MbQeThVmYq3t6w9z$C&F)J@Nc";

const COOKIE_FILE_SUFFIX: &str = ".cookies.json";

/// Durable, per-identity cookie persistence. One JSON file per session
/// label (the login session plus one per team) under a directory whose
/// name is an HMAC of the identity.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    root: PathBuf,
}

impl CredentialStore {
    pub fn new(root: PathBuf) -> Self {
        CredentialStore { root }
    }

    /// Hex HMAC-SHA256 of the identity under the fixed key.
    pub fn namespace(identity: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(NAMESPACE_KEY).expect("HMAC accepts any key length");
        mac.update(identity.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn file_path(&self, identity: &str, label: &str) -> PathBuf {
        self.root
            .join(Self::namespace(identity))
            .join(format!("{label}{COOKIE_FILE_SUFFIX}"))
    }

    /// Loads the persisted store for (identity, label). An absent or
    /// unreadable file yields an empty store, never an error.
    pub fn load(&self, identity: &str, label: &str) -> CookieStore {
        let path = self.file_path(identity, label);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    warn!("Can't open cookie file {}: {err}", path.display());
                }
                return CookieStore::default();
            }
        };
        match CookieStore::load_json_all(BufReader::new(file)) {
            Ok(store) => store,
            Err(err) => {
                warn!("Discarding corrupt cookie file {}: {err}", path.display());
                CookieStore::default()
            }
        }
    }

    /// Persists the jar atomically: write a temp file, then rename over
    /// the target. Session (non-persistent) cookies are included since
    /// the remote auth cookies carry no expiry.
    pub fn save(
        &self,
        identity: &str,
        label: &str,
        jar: &CookieStoreMutex,
    ) -> Result<(), AscError> {
        let path = self.file_path(identity, label);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            let store = jar.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            store
                .save_incl_expired_and_nonpersistent_json(&mut writer)
                .map_err(|err| std::io::Error::new(ErrorKind::Other, err.to_string()))?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}
