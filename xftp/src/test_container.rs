use std::borrow::Cow;

use testcontainers::core::{CmdWaitFor, ExecCommand, WaitFor};
use testcontainers::{Container, Image};

#[derive(Debug, Default, Clone)]
struct PureFtpImage {
    _priv: (),
}

impl Image for PureFtpImage {
    fn name(&self) -> &str {
        "stilliard/pure-ftpd"
    }

    fn tag(&self) -> &str {
        "latest"
    }

    fn ready_conditions(&self) -> Vec<WaitFor> {
        vec![WaitFor::message_on_stdout("Starting Pure-FTPd")]
    }

    fn env_vars(
        &self,
    ) -> impl IntoIterator<Item = (impl Into<Cow<'_, str>>, impl Into<Cow<'_, str>>)> {
        vec![
            ("PUBLICHOST", "localhost"),
            ("FTP_USER_NAME", "test"),
            ("FTP_USER_PASS", "test"),
            ("FTP_USER_HOME", "/home/test"),
        ]
    }
}

/// A pure-ftpd server with user `test` (password `test`) and a file whose name isn't valid UTF-8
pub struct SyncPureFtpRunner {
    container: Container<PureFtpImage>,
}

impl SyncPureFtpRunner {
    pub fn start() -> Self {
        use testcontainers::runners::SyncRunner;
        let container = PureFtpImage::default()
            .start()
            .expect("Failed to start container");

        Self::exec(&container, &["/bin/mkdir", "-p", "/home/test/invalid-utf8"]);
        Self::exec(
            &container,
            &["/usr/bin/touch", "/home/test/invalid-utf8/caf\\303\\251.txt"],
        );

        Self { container }
    }

    fn exec(container: &Container<PureFtpImage>, cmd: &[&str]) {
        let resp = container
            .exec(
                ExecCommand::new(cmd.iter().copied())
                    .with_cmd_ready_condition(CmdWaitFor::Exit { code: Some(0) }),
            )
            .unwrap_or_else(|err| panic!("Failed to run {cmd:?}: {err}"));
        assert_eq!(
            resp.exit_code()
                .expect("failed to get exit code")
                .expect("no exit code"),
            0,
            "{cmd:?} failed"
        );
    }

    pub fn get_ftp_port(&self) -> u16 {
        self.container.get_host_port_ipv4(21).unwrap()
    }

    pub fn get_mapped_port(&self, port: u16) -> u16 {
        self.container.get_host_port_ipv4(port).unwrap()
    }
}
