//! Picks the one address of a server that discovery reports for it.
//!
//! Each address family has an ordered list of candidate sources; the first
//! source yielding an address wins.
//!
//! - `public_v4` / `public_v6`: the attached public address unless it is
//!   absent or blocked, then the first unblocked floating IP of that family.
//! - `private_v4`: the address in the first private network. Never falls
//!   back to public addresses.

use std::net::IpAddr;

use crate::{config::AddressFamily, logger::Logger};

use super::api::{IpFamily, ServerRecord};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Candidate {
    Private,
    Public(IpFamily),
    Floating(IpFamily),
}

const PRIVATE_V4: &[Candidate] = &[Candidate::Private];
const PUBLIC_V4: &[Candidate] = &[
    Candidate::Public(IpFamily::V4),
    Candidate::Floating(IpFamily::V4),
];
const PUBLIC_V6: &[Candidate] = &[
    Candidate::Public(IpFamily::V6),
    Candidate::Floating(IpFamily::V6),
];

fn candidates(family: AddressFamily) -> &'static [Candidate] {
    match family {
        AddressFamily::PrivateV4 => PRIVATE_V4,
        AddressFamily::PublicV4 => PUBLIC_V4,
        AddressFamily::PublicV6 => PUBLIC_V6,
    }
}

fn label(family: IpFamily) -> &'static str {
    match family {
        IpFamily::V4 => "IPv4",
        IpFamily::V6 => "IPv6",
    }
}

impl Candidate {
    fn pick(self, s: &ServerRecord, logger: &dyn Logger) -> Option<IpAddr> {
        let endpoints = &s.endpoints;
        match self {
            Candidate::Private => match endpoints.private.first() {
                Some(ip) => {
                    logger.info(&format!(
                        "instance {} ({}) has private IP {}",
                        s.name, s.id, ip
                    ));
                    Some(*ip)
                }
                None => {
                    logger.info(&format!("instance {} ({}) has no private IP", s.name, s.id));
                    None
                }
            },
            Candidate::Public(family) => {
                let public = match family {
                    IpFamily::V4 => endpoints.public_v4.as_ref(),
                    IpFamily::V6 => endpoints.public_v6.as_ref(),
                };
                match public {
                    Some(public) if !public.blocked => {
                        logger.info(&format!(
                            "instance {} ({}) has public IP {}",
                            s.name, s.id, public.ip
                        ));
                        Some(public.ip)
                    }
                    Some(_) => {
                        if !endpoints.floating.is_empty() {
                            logger.info(&format!(
                                "public {} for instance {} ({}) is blocked, checking associated floating IPs",
                                label(family),
                                s.name,
                                s.id
                            ));
                        }
                        None
                    }
                    None => {
                        logger.debug(&format!(
                            "instance {} ({}) has no public {}, checking associated floating IPs",
                            s.name,
                            s.id,
                            label(family)
                        ));
                        None
                    }
                }
            }
            Candidate::Floating(family) => {
                let floating = endpoints
                    .floating
                    .iter()
                    .find(|f| f.family == family && !f.blocked)?;
                logger.info(&format!(
                    "instance {} ({}) has floating IP {}",
                    s.name, s.id, floating.ip
                ));
                Some(floating.ip)
            }
        }
    }
}

/// Returns the address to report for `server`, or `None` if it has no
/// usable address of the requested family.
pub fn select(server: &ServerRecord, family: AddressFamily, logger: &dyn Logger) -> Option<IpAddr> {
    let selected = candidates(family)
        .iter()
        .find_map(|candidate| candidate.pick(server, logger));

    if selected.is_none() {
        logger.debug(&format!(
            "instance {} ({}) has no valid associated IP address",
            server.name, server.id
        ));
    }

    selected
}
