//! Key generation and persistence.
//!
//! Keys are produced by the `wg` tool and stored as raw text in flat files
//! under the keystore directory. Key text is treated as opaque: nothing here
//! checks that it is valid base64 or a valid Curve25519 point.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::Result;
use crate::executor::{CommandExecutor, Invocation};
use crate::settings::Settings;
use crate::store;

/// Text of a freshly generated keypair, as written to the keystore.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedKeys {
    /// Raw `wg genkey` output.
    pub private_key: String,
    /// Raw `wg pubkey` output.
    pub public_key: String,
}

impl fmt::Debug for GeneratedKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedKeys")
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Generates and reads key material in the keystore.
#[derive(Clone, Debug)]
pub struct KeyManager<E: CommandExecutor> {
    executor: E,
    settings: Arc<Settings>,
}

impl<E: CommandExecutor> KeyManager<E> {
    /// Creates a key manager.
    #[must_use]
    pub fn new(executor: E, settings: Arc<Settings>) -> Self {
        Self { executor, settings }
    }

    /// Runs `wg genkey` and stores its raw output as `name`.
    ///
    /// Returns the generated text. An existing key file of the same name is
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for a bad `name`, `CommandExecution` if `wg`
    /// fails, `FileIo` if the key cannot be written, or `Cancelled`.
    pub async fn generate_private_key(&self, cancel: &CancellationToken, name: &str) -> Result<String> {
        let path = self.settings.key_path(name)?;
        let invocation = Invocation::new(&self.settings.wg_bin).arg("genkey");
        let output = self.executor.execute(cancel, &invocation).await?;

        store::write_secret_file(&path, &output).await?;
        info!(key = %name, path = %path.display(), "private key generated");

        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    /// Derives the public key for the stored private key `private_name` and
    /// stores it as `public_name`.
    ///
    /// The private key file is piped to `wg pubkey` on stdin. Returns the
    /// derived text.
    ///
    /// # Errors
    ///
    /// Returns `FileIo` if the private key cannot be read or the public key
    /// cannot be written, `CommandExecution` if `wg` fails, or `Cancelled`.
    pub async fn generate_public_key(
        &self,
        cancel: &CancellationToken,
        private_name: &str,
        public_name: &str,
    ) -> Result<String> {
        let private_path = self.settings.key_path(private_name)?;
        let public_path = self.settings.key_path(public_name)?;

        let private_key = store::read_file(&private_path).await?;
        let invocation = Invocation::new(&self.settings.wg_bin)
            .arg("pubkey")
            .with_stdin(private_key);
        let output = self.executor.execute(cancel, &invocation).await?;

        store::write_secret_file(&public_path, &output).await?;
        info!(
            private = %private_name,
            public = %public_name,
            "public key derived"
        );

        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    /// Generates a private key and its public half in one step.
    ///
    /// # Errors
    ///
    /// Fails on the first failing step; a private key already written is
    /// left in place.
    pub async fn generate_keypair(
        &self,
        cancel: &CancellationToken,
        private_name: &str,
        public_name: &str,
    ) -> Result<GeneratedKeys> {
        let private_key = self.generate_private_key(cancel, private_name).await?;
        let public_key = self
            .generate_public_key(cancel, private_name, public_name)
            .await?;
        Ok(GeneratedKeys {
            private_key,
            public_key,
        })
    }

    /// Reads stored key material `name` through the content-read command.
    ///
    /// # Errors
    ///
    /// Returns `CommandExecution` if the read command fails (for instance
    /// when the key does not exist), or `Cancelled`.
    pub async fn get_content(&self, cancel: &CancellationToken, name: &str) -> Result<String> {
        let path = self.settings.key_path(name)?;
        let invocation = Invocation::new(&self.settings.cat_bin).arg(path.to_string_lossy());
        let output = self.executor.execute(cancel, &invocation).await?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WgError;
    use crate::executor::{ProcessExecutor, RecordingExecutor};

    fn recording_keys(dir: &std::path::Path) -> (KeyManager<RecordingExecutor>, RecordingExecutor) {
        let exec = RecordingExecutor::new();
        let keys = KeyManager::new(exec.clone(), Arc::new(Settings::new(dir)));
        (keys, exec)
    }

    #[tokio::test]
    async fn generate_private_key_persists_raw_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (keys, exec) = recording_keys(dir.path());
        exec.push_output("cGFzc3dvcmQxMjM0NTY3ODkwMTIzNDU2Nzg5MDEyMzQ=\n");

        let key = keys
            .generate_private_key(&CancellationToken::new(), "privatekey")
            .await
            .expect("generated");

        assert_eq!(key, "cGFzc3dvcmQxMjM0NTY3ODkwMTIzNDU2Nzg5MDEyMzQ=\n");
        let stored = std::fs::read_to_string(dir.path().join("privatekey")).expect("stored");
        assert_eq!(stored, key);

        let call = exec.last_call().expect("recorded");
        assert_eq!(call.to_string(), "wg genkey");
    }

    #[tokio::test]
    async fn generate_private_key_overwrites_existing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (keys, exec) = recording_keys(dir.path());
        let cancel = CancellationToken::new();
        exec.push_output("FIRST-KEY-WITH-LONGER-TEXT\n");
        exec.push_output("SECOND\n");

        keys.generate_private_key(&cancel, "k").await.expect("first");
        keys.generate_private_key(&cancel, "k").await.expect("second");

        let stored = std::fs::read_to_string(dir.path().join("k")).expect("stored");
        assert_eq!(stored, "SECOND\n");
    }

    #[tokio::test]
    async fn generate_private_key_tool_failure_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (keys, exec) = recording_keys(dir.path());
        exec.push_failure(127, "wg: command not found");

        let err = keys
            .generate_private_key(&CancellationToken::new(), "privatekey")
            .await
            .expect_err("tool fails");

        assert!(err.is_command_failure());
        assert!(!dir.path().join("privatekey").exists());
    }

    #[tokio::test]
    async fn generate_private_key_write_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (keys, exec) = recording_keys(&dir.path().join("missing"));
        exec.push_output("KEY\n");

        let err = keys
            .generate_private_key(&CancellationToken::new(), "privatekey")
            .await
            .expect_err("keystore dir missing");
        assert!(matches!(err, WgError::FileIo { .. }));
    }

    #[tokio::test]
    async fn invalid_name_runs_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (keys, exec) = recording_keys(dir.path());

        let err = keys
            .generate_private_key(&CancellationToken::new(), "../escape")
            .await
            .expect_err("rejected");
        assert!(matches!(err, WgError::InvalidName { .. }));
        assert_eq!(exec.call_count(), 0);
    }

    #[tokio::test]
    async fn generate_public_key_pipes_private_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (keys, exec) = recording_keys(dir.path());
        std::fs::write(dir.path().join("privatekey"), "PRIVKEY\n").expect("seed private key");
        exec.push_output("PUBKEY\n");

        let public = keys
            .generate_public_key(&CancellationToken::new(), "privatekey", "publickey")
            .await
            .expect("derived");

        assert_eq!(public, "PUBKEY\n");
        let call = exec.last_call().expect("recorded");
        assert_eq!(call.to_string(), "wg pubkey");
        assert_eq!(call.stdin_payload(), Some(&b"PRIVKEY\n"[..]));
        let stored = std::fs::read_to_string(dir.path().join("publickey")).expect("stored");
        assert_eq!(stored, "PUBKEY\n");
    }

    #[tokio::test]
    async fn generate_public_key_missing_private_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (keys, exec) = recording_keys(dir.path());

        let err = keys
            .generate_public_key(&CancellationToken::new(), "absent", "publickey")
            .await
            .expect_err("no private key");
        assert!(matches!(err, WgError::FileIo { .. }));
        assert_eq!(exec.call_count(), 0);
    }

    #[tokio::test]
    async fn generate_keypair_runs_genkey_then_pubkey() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (keys, exec) = recording_keys(dir.path());
        exec.push_output("PRIV\n");
        exec.push_output("PUB\n");

        let generated = keys
            .generate_keypair(&CancellationToken::new(), "server.key", "server.pub")
            .await
            .expect("keypair");

        assert_eq!(generated.private_key, "PRIV\n");
        assert_eq!(generated.public_key, "PUB\n");
        assert!(!format!("{generated:?}").contains("PRIV\\n"));

        let calls = exec.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].to_string(), "wg genkey");
        assert_eq!(calls[1].stdin_payload(), Some(&b"PRIV\n"[..]));
    }

    #[tokio::test]
    async fn get_content_reads_through_cat() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (keys, exec) = recording_keys(dir.path());
        exec.push_output("PUB\n");

        let content = keys
            .get_content(&CancellationToken::new(), "publickey")
            .await
            .expect("read");

        assert_eq!(content, "PUB\n");
        let call = exec.last_call().expect("recorded");
        assert_eq!(call.program(), "cat");
        assert_eq!(
            call.arguments(),
            &[dir.path().join("publickey").to_string_lossy().into_owned()]
        );
    }

    #[tokio::test]
    async fn get_content_missing_key_is_command_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let keys = KeyManager::new(ProcessExecutor::new(), Arc::new(Settings::new(dir.path())));

        let err = keys
            .get_content(&CancellationToken::new(), "absent")
            .await
            .expect_err("cat fails");
        assert!(err.is_command_failure());
        assert!(err.output().is_some_and(|out| out.contains("absent")));
    }

    // `echo genkey` stands in for `wg genkey`, so the round trip runs real
    // processes end to end.
    #[tokio::test]
    async fn generated_key_reads_back_identically() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::new(dir.path()).with_wg_bin("echo");
        let keys = KeyManager::new(ProcessExecutor::new(), Arc::new(settings));
        let cancel = CancellationToken::new();

        let generated = keys.generate_private_key(&cancel, "privatekey").await.expect("generated");
        let read_back = keys.get_content(&cancel, "privatekey").await.expect("read back");

        assert_eq!(generated, "genkey\n");
        assert_eq!(read_back, generated);
    }

    mod proptest_tests {
        use super::*;
        use crate::validate::validate_name;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn any_valid_name_reads_back_what_was_generated(name in "[A-Za-z0-9_.-]{1,24}") {
                prop_assume!(validate_name(&name).is_ok());

                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("runtime");
                let dir = tempfile::tempdir().expect("tempdir");
                let settings = Settings::new(dir.path()).with_wg_bin("echo");
                let keys = KeyManager::new(ProcessExecutor::new(), Arc::new(settings));
                let cancel = CancellationToken::new();

                let (generated, read_back) = runtime.block_on(async {
                    let generated = keys.generate_private_key(&cancel, &name).await.expect("generated");
                    let read_back = keys.get_content(&cancel, &name).await.expect("read back");
                    (generated, read_back)
                });

                prop_assert_eq!(&generated, "genkey\n");
                prop_assert_eq!(read_back, generated);
            }
        }
    }
}
