// src/repository/yum.rs

//! Yum/dnf repository listing
//!
//! Reads `repodata/repomd.xml` to find the `primary` metadata, fetches
//! and decompresses it, and turns every `<package type="rpm">` entry into
//! a [`Nevra`]. Only identity fields are extracted.

use super::client::{decode_metadata, MetadataFetcher, RepositoryClient};
use super::{RepositoryKind, RepositoryLister};
use crate::error::{Error, Result};
use crate::nevra::Nevra;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::{debug, info};
use url::Url;

const REPOMD_PATH: &str = "repodata/repomd.xml";

/// Lists packages of a yum repository, over HTTP(S) by default
pub struct YumLister<F = RepositoryClient> {
    fetcher: F,
}

impl<F: MetadataFetcher> YumLister<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F: MetadataFetcher> RepositoryLister for YumLister<F> {
    fn list_packages(&self, label: &str, source_url: &str) -> Result<Vec<Nevra>> {
        let base = match RepositoryKind::detect(source_url)? {
            RepositoryKind::Yum(base) => base,
            RepositoryKind::Local => {
                return Err(Error::InvalidSource {
                    url: source_url.to_string(),
                    reason: "local sources cannot be listed".to_string(),
                });
            }
        };

        let repomd_url = join(&base, REPOMD_PATH)?;
        debug!("Fetching {} for repository {}", repomd_url, label);
        let repomd = self.fetcher.fetch(repomd_url.as_str())?;

        let href = primary_location(&repomd)?;
        let primary_url = join(&base, &href)?;
        let body = self.fetcher.fetch(primary_url.as_str())?;
        let primary = decode_metadata(primary_url.as_str(), &body)?;

        let packages = parse_primary(&primary)?;
        info!("Repository {} lists {} packages", label, packages.len());
        Ok(packages)
    }
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| Error::ParseError(format!("Cannot resolve {path} against {base}: {e}")))
}

fn attribute(element: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| Error::ParseError(format!("Malformed XML attribute: {e}")))?;
        if attr.key.local_name().as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::ParseError(format!("Malformed XML attribute value: {e}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Extract the `location href` of the `primary` data entry from repomd.xml
pub fn primary_location(repomd: &[u8]) -> Result<String> {
    let mut reader = Reader::from_reader(repomd);
    reader.trim_text(true);

    let mut in_primary = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match e.local_name().as_ref() {
                    b"data" => {
                        in_primary = attribute(e, b"type")?.as_deref() == Some("primary");
                    }
                    b"location" if in_primary => {
                        if let Some(href) = attribute(e, b"href")? {
                            return Ok(href);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"data" => {
                in_primary = false;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::ParseError(format!("repomd.xml parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    Err(Error::ParseError(
        "repomd.xml has no primary metadata location".to_string(),
    ))
}

#[derive(Default)]
struct PartialPackage {
    name: Option<String>,
    arch: Option<String>,
    epoch: Option<String>,
    ver: Option<String>,
    rel: Option<String>,
}

impl PartialPackage {
    fn finish(self) -> Option<Nevra> {
        Some(Nevra::new(
            self.name?,
            self.epoch,
            self.ver?,
            self.rel?,
            self.arch?,
        ))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Name,
    Arch,
}

/// Parse primary.xml into package identities
///
/// Non-rpm entries are ignored. Entries missing any identity field are
/// dropped with a debug message rather than failing the whole listing.
pub fn parse_primary(xml: &[u8]) -> Result<Vec<Nevra>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut packages = Vec::new();
    let mut current: Option<PartialPackage> = None;
    let mut package_depth = 0usize;
    let mut depth = 0usize;
    let mut field = Field::None;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let local = e.local_name();
                if local.as_ref() == b"package" {
                    if attribute(e, b"type")?.as_deref().unwrap_or("rpm") == "rpm" {
                        current = Some(PartialPackage::default());
                        package_depth = depth;
                    }
                } else if let Some(pkg) = current.as_mut() {
                    if depth == package_depth + 1 {
                        field = match local.as_ref() {
                            b"name" => Field::Name,
                            b"arch" => Field::Arch,
                            b"version" => {
                                read_version(e, pkg)?;
                                Field::None
                            }
                            _ => Field::None,
                        };
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                if let Some(pkg) = current.as_mut() {
                    if depth == package_depth && e.local_name().as_ref() == b"version" {
                        read_version(e, pkg)?;
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(pkg) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::ParseError(format!("Malformed XML text: {e}")))?
                        .into_owned();
                    match field {
                        Field::Name => pkg.name = Some(text),
                        Field::Arch => pkg.arch = Some(text),
                        Field::None => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                field = Field::None;
                if current.is_some() && depth == package_depth && e.local_name().as_ref() == b"package" {
                    if let Some(pkg) = current.take() {
                        match pkg.finish() {
                            Some(nevra) => packages.push(nevra),
                            None => debug!("Skipping primary.xml package entry with missing fields"),
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::ParseError(format!("primary.xml parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(packages)
}

fn read_version(element: &BytesStart, pkg: &mut PartialPackage) -> Result<()> {
    pkg.epoch = attribute(element, b"epoch")?;
    pkg.ver = attribute(element, b"ver")?;
    pkg.rel = attribute(element, b"rel")?;
    Ok(())
}
