//! Self-hosted validation checks: address shape, domain resolution, and a
//! direct mailbox probe against the domain's primary MX.

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use hickory_resolver::TokioAsyncResolver;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

const DNS_TIMEOUT: Duration = Duration::from_secs(5);
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);
const SMTP_PORT: u16 = 25;

fn address_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("valid address shape regex")
    })
}

/// Syntactic shape check. Deliberately permissive; the later layers decide
/// whether the address actually exists.
pub fn is_valid_format(email: &str) -> bool {
    address_shape().is_match(email)
}

/// Result of resolving an address's domain.
#[derive(Debug, Clone)]
pub struct DomainCheck {
    pub resolvable: bool,
    /// Lowest-preference MX exchange, if the domain publishes MX records.
    pub primary_mx: Option<String>,
}

/// Resolves the domain via MX lookup, falling back to A/AAAA when the
/// domain publishes no MX records. `Err` means the resolver itself could
/// not be consulted, not that the domain is bad.
pub async fn check_domain(domain: &str) -> Result<DomainCheck> {
    let resolver = TokioAsyncResolver::tokio_from_system_conf()
        .context("Failed to create DNS resolver from system configuration")?;

    match tokio::time::timeout(DNS_TIMEOUT, resolver.mx_lookup(domain)).await {
        Ok(Ok(mx)) => {
            let primary = mx
                .iter()
                .min_by_key(|record| record.preference())
                .map(|record| record.exchange().to_string().trim_end_matches('.').to_string());
            if let Some(host) = primary.as_deref() {
                debug!("Primary MX for {domain}: {host}");
                return Ok(DomainCheck {
                    resolvable: true,
                    primary_mx: primary,
                });
            }
        }
        Ok(Err(e)) => {
            debug!("MX lookup failed for {domain}: {e}, falling back to A/AAAA lookup");
        }
        Err(_) => {
            debug!("MX lookup timed out for {domain}, falling back to A/AAAA lookup");
        }
    }

    let resolvable = match tokio::time::timeout(DNS_TIMEOUT, resolver.lookup_ip(domain)).await {
        Ok(Ok(ips)) => ips.iter().next().is_some(),
        Ok(Err(e)) => {
            debug!("A/AAAA lookup failed for {domain}: {e}");
            false
        }
        Err(_) => {
            debug!("A/AAAA lookup timed out for {domain}");
            false
        }
    };

    Ok(DomainCheck {
        resolvable,
        primary_mx: None,
    })
}

/// Outcome of the mailbox probe. An inconclusive probe never marks an
/// address invalid; many MTAs reject or greylist verification dialogs.
#[derive(Debug, Clone)]
pub struct MailboxProbe {
    pub deliverable: bool,
    pub conclusive: bool,
    pub detail: String,
}

impl MailboxProbe {
    fn inconclusive(detail: impl Into<String>) -> Self {
        Self {
            deliverable: false,
            conclusive: false,
            detail: detail.into(),
        }
    }
}

/// Probes the mailbox with a minimal SMTP dialog (EHLO, MAIL FROM, RCPT TO,
/// QUIT) against the domain's primary MX. A 250 on RCPT means deliverable;
/// everything else, including connection failures, is inconclusive.
pub async fn probe_mailbox(mx_host: &str, email: &str, probe_from: &str) -> MailboxProbe {
    match tokio::time::timeout(SMTP_TIMEOUT, probe_dialog(mx_host, email, probe_from)).await {
        Ok(Ok(probe)) => probe,
        Ok(Err(e)) => {
            debug!("Mailbox probe against {mx_host} failed: {e}");
            MailboxProbe::inconclusive(format!("probe failed: {e}"))
        }
        Err(_) => {
            debug!("Mailbox probe against {mx_host} timed out");
            MailboxProbe::inconclusive("probe timed out")
        }
    }
}

async fn probe_dialog(mx_host: &str, email: &str, probe_from: &str) -> Result<MailboxProbe> {
    let stream = TcpStream::connect((mx_host, SMTP_PORT))
        .await
        .with_context(|| format!("Failed to connect to {mx_host}:{SMTP_PORT}"))?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    read_reply(&mut reader).await.context("No SMTP greeting")?;

    send_command(&mut write_half, "EHLO prospect-api.local").await?;
    read_reply(&mut reader).await.context("EHLO rejected")?;

    send_command(&mut write_half, &format!("MAIL FROM:<{probe_from}>")).await?;
    read_reply(&mut reader).await.context("MAIL FROM rejected")?;

    send_command(&mut write_half, &format!("RCPT TO:<{email}>")).await?;
    let rcpt = read_reply(&mut reader).await.context("No RCPT reply")?;

    // Best effort; the verdict is already decided.
    let _ = send_command(&mut write_half, "QUIT").await;

    if rcpt.code == 250 {
        Ok(MailboxProbe {
            deliverable: true,
            conclusive: true,
            detail: format!("RCPT accepted: {}", rcpt.text),
        })
    } else {
        Ok(MailboxProbe::inconclusive(format!(
            "RCPT replied {}: {}",
            rcpt.code, rcpt.text
        )))
    }
}

struct SmtpReply {
    code: u16,
    text: String,
}

async fn send_command(
    write_half: &mut tokio::net::tcp::OwnedWriteHalf,
    command: &str,
) -> Result<()> {
    write_half
        .write_all(format!("{command}\r\n").as_bytes())
        .await
        .with_context(|| format!("Failed to send {command}"))?;
    Ok(())
}

/// Reads one SMTP reply, consuming continuation lines ("250-...") until the
/// final "250 ..." line.
async fn read_reply(
    reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
) -> Result<SmtpReply> {
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(anyhow!("Connection closed mid-reply"));
        }
        let trimmed = line.trim_end();
        if trimmed.len() < 4 {
            return Err(anyhow!("Malformed SMTP reply: {trimmed}"));
        }
        if trimmed.as_bytes()[3] == b' ' {
            let code = trimmed[..3]
                .parse::<u16>()
                .with_context(|| format!("Non-numeric SMTP reply code: {trimmed}"))?;
            return Ok(SmtpReply {
                code,
                text: trimmed[4..].to_string(),
            });
        }
        // "xyz-" continuation line; keep reading.
    }
}
