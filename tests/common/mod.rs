// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use channel_export::db;
use channel_export::{ExportConfig, Exporter, Nevra, RepositoryLister, Result, RunSummary};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

pub const MIRROR_URL: &str = "https://mirror.example.com/el9/baseos/";
pub const LOCAL_URL: &str = "file:///var/satellite/custom";

/// A package row of the fixture store
struct FixturePackage {
    id: i64,
    name: &'static str,
    epoch: Option<&'static str>,
    version: &'static str,
    release: &'static str,
    arch: &'static str,
    checksum: &'static str,
    materialised: bool,
}

const PACKAGES: &[FixturePackage] = &[
    FixturePackage {
        id: 1,
        name: "bash",
        epoch: None,
        version: "5.1.8",
        release: "6.el9",
        arch: "x86_64",
        checksum: "a1b2c3d4e5",
        materialised: true,
    },
    FixturePackage {
        id: 2,
        name: "vim",
        epoch: Some("2"),
        version: "9.0.2081",
        release: "1.el9",
        arch: "x86_64",
        checksum: "b2c3d4e5f6",
        materialised: true,
    },
    FixturePackage {
        id: 3,
        name: "custom-tool",
        epoch: None,
        version: "1.0",
        release: "1",
        arch: "noarch",
        checksum: "c3d4e5f6a7",
        materialised: true,
    },
    FixturePackage {
        id: 4,
        name: "ghost",
        epoch: None,
        version: "0.1",
        release: "1",
        arch: "noarch",
        checksum: "d4e5f6a7b8",
        materialised: false,
    },
];

impl FixturePackage {
    fn basename(&self) -> String {
        format!("{}-{}-{}.{}.rpm", self.name, self.version, self.release, self.arch)
    }

    fn store_path(&self) -> String {
        let evr = match self.epoch {
            Some(epoch) => format!("{}:{}-{}", epoch, self.version, self.release),
            None => format!("{}-{}", self.version, self.release),
        };
        format!(
            "redhat/1/{}/{}/{}/{}/{}/{}",
            &self.checksum[..3],
            self.name,
            evr,
            self.arch,
            self.checksum,
            self.basename()
        )
    }

    fn payload(&self) -> Vec<u8> {
        format!("{} payload", self.name).into_bytes()
    }
}

/// Scratch store, package mount point and export root.
///
/// Keep the value alive for the duration of the test; dropping it removes
/// the temporary directory.
pub struct Fixture {
    pub temp: TempDir,
    pub db_path: PathBuf,
    pub mount_point: PathBuf,
    pub export_root: PathBuf,
}

impl Fixture {
    /// Store with one organization and two channels:
    ///
    /// - 10 `rhel-base`: bash
    /// - 11 `clone-rhel-base`, cloned from 10: bash, vim, custom-tool, ghost (no path)
    ///
    /// Channel 11 is linked to a remote mirror (1) and a local source (2).
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("store").join("spacewalk.db");
        let mount_point = temp.path().join("satellite");
        let export_root = temp.path().join("export");

        let conn = db::init(&db_path).unwrap();
        conn.execute_batch(&format!(
            "INSERT INTO web_customer (id, name) VALUES (1, 'Acme');
             INSERT INTO rhnChannel (id, org_id, label) VALUES (10, 1, 'rhel-base');
             INSERT INTO rhnChannel (id, org_id, label) VALUES (11, 1, 'clone-rhel-base');
             INSERT INTO rhnChannelCloned (id, original_id) VALUES (11, 10);
             INSERT INTO rhnPackageArch (id, label) VALUES (1, 'x86_64'), (2, 'noarch');
             INSERT INTO rhnChecksumType (id, label) VALUES (1, 'sha256');
             INSERT INTO rhnContentSource (id, org_id, label, source_url)
                 VALUES (1, 1, 'baseos-mirror', '{MIRROR_URL}'), (2, 1, 'custom-local', '{LOCAL_URL}');
             INSERT INTO rhnChannelContentSource (channel_id, source_id) VALUES (11, 1), (11, 2);"
        ))
        .unwrap();

        for pkg in PACKAGES {
            let arch_id = if pkg.arch == "x86_64" { 1 } else { 2 };
            let payload = pkg.payload();
            let path = pkg.materialised.then(|| pkg.store_path());

            conn.execute(
                "INSERT INTO rhnPackageName (id, name) VALUES (?1, ?2)",
                rusqlite::params![pkg.id, pkg.name],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO rhnPackageEVR (id, epoch, version, release) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![pkg.id, pkg.epoch, pkg.version, pkg.release],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO rhnChecksum (id, checksum_type_id, checksum) VALUES (?1, 1, ?2)",
                rusqlite::params![pkg.id, pkg.checksum],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO rhnPackage (id, org_id, name_id, evr_id, package_arch_id, checksum_id, package_size, path)
                 VALUES (?1, 1, ?1, ?1, ?2, ?1, ?3, ?4)",
                rusqlite::params![pkg.id, arch_id, payload.len() as i64, path],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO rhnChannelPackage (channel_id, package_id) VALUES (11, ?1)",
                [pkg.id],
            )
            .unwrap();

            if let Some(path) = path {
                let file = mount_point.join(path);
                fs::create_dir_all(file.parent().unwrap()).unwrap();
                fs::write(&file, &payload).unwrap();
            }
        }

        conn.execute(
            "INSERT INTO rhnChannelPackage (channel_id, package_id) VALUES (10, 1)",
            [],
        )
        .unwrap();

        Self {
            temp,
            db_path,
            mount_point,
            export_root,
        }
    }

    /// Configuration exporting into the fixture root, without a metadata build
    pub fn config(&self) -> ExportConfig {
        let mut config = ExportConfig::new(&self.export_root);
        config.database = self.db_path.clone();
        config.mount_point = self.mount_point.clone();
        config.skip_metadata_build = true;
        config
    }

    /// Absolute path of a fixture package in the package store
    pub fn source_path(&self, name: &str) -> PathBuf {
        let pkg = PACKAGES
            .iter()
            .find(|pkg| pkg.name == name)
            .unwrap_or_else(|| panic!("no fixture package {name}"));
        self.mount_point.join(pkg.store_path())
    }

    pub fn channel_dir(&self, channel_id: i64) -> PathBuf {
        self.export_root.join("1").join(channel_id.to_string())
    }

    pub fn report(&self, channel_id: i64) -> String {
        fs::read_to_string(self.export_root.join("1").join(format!("{channel_id}.csv"))).unwrap()
    }

    pub fn index(&self) -> String {
        fs::read_to_string(self.export_root.join("export.csv")).unwrap()
    }

    /// Modify the fixture store before a run
    pub fn execute(&self, sql: &str) {
        let conn = rusqlite::Connection::open(&self.db_path).unwrap();
        conn.execute_batch(sql).unwrap();
    }

    /// Open the store read-only and run a complete export
    pub fn run(&self, config: &ExportConfig, lister: &dyn RepositoryLister) -> RunSummary {
        config.validate().unwrap();
        config.prepare_export_root().unwrap();
        let conn = db::open(&self.db_path).unwrap();
        Exporter::new(&conn, config, lister).run().unwrap()
    }
}

/// File names in `dir`, sorted
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// In-memory repository lister recording every locator it is asked about
pub struct FakeLister {
    listings: HashMap<String, Vec<Nevra>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeLister {
    pub fn new(listings: Vec<(&str, Vec<&str>)>) -> Self {
        let listings = listings
            .into_iter()
            .map(|(url, ids)| {
                let nevras: Vec<Nevra> = ids.iter().map(|id| id.parse().unwrap()).collect();
                (url.to_string(), nevras)
            })
            .collect();
        Self {
            listings,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The fixture mirror, listing vim and (redundantly) bash
    pub fn mirror() -> Self {
        Self::new(vec![(
            MIRROR_URL,
            vec!["vim-2:9.0.2081-1.el9.x86_64", "bash-0:5.1.8-6.el9.x86_64"],
        )])
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl RepositoryLister for FakeLister {
    fn list_packages(&self, _label: &str, source_url: &str) -> Result<Vec<Nevra>> {
        self.calls.lock().unwrap().push(source_url.to_string());
        Ok(self.listings.get(source_url).cloned().unwrap_or_default())
    }
}
