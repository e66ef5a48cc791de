//! # Nat
//!
//! Fixes the address advertised in a PASV reply by servers behind NAT

use std::fmt;
use std::net::IpAddr;

use crate::{FtpError, FtpResult};

/// Maps the host advertised by the server to the host to connect to
pub type NatResolver = dyn Fn(&str) -> String + Send + Sync;

/// What to do with the address in a `227` reply
#[derive(Default)]
pub enum NatWorkaround {
    /// Connect to the advertised address
    Disabled,
    /// Connect to the control connection peer when the advertised address is
    /// site-local or link-local and the peer isn't
    #[default]
    ReplaceSiteLocal,
    /// Ask the resolver which host to connect to
    Resolver(Box<NatResolver>),
}

impl fmt::Debug for NatWorkaround {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "Disabled"),
            Self::ReplaceSiteLocal => write!(f, "ReplaceSiteLocal"),
            Self::Resolver(_) => write!(f, "Resolver(<?>)"),
        }
    }
}

impl NatWorkaround {
    /// Address to open the passive data connection to
    pub fn apply(&self, passive: IpAddr, remote: IpAddr) -> FtpResult<IpAddr> {
        match self {
            Self::Disabled => Ok(passive),
            Self::ReplaceSiteLocal if is_site_local(&passive) && !is_site_local(&remote) => {
                debug!("Replacing site local address {passive} with {remote}");
                Ok(remote)
            }
            Self::ReplaceSiteLocal => Ok(passive),
            Self::Resolver(resolver) => {
                let resolved = resolver(&passive.to_string());
                debug!("Passive address {passive} resolved to {resolved}");
                resolved
                    .trim()
                    .parse::<IpAddr>()
                    .map_err(FtpError::InvalidAddress)
            }
        }
    }
}

fn is_site_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ip) => ip.is_private() || ip.is_link_local(),
        // fe80::/10 and the deprecated fec0::/10
        IpAddr::V6(ip) => matches!(ip.segments()[0] & 0xffc0, 0xfe80 | 0xfec0),
    }
}
