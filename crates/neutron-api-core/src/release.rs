//! OpenStack releases, Ubuntu series and install sources
//!
//! Both release types are enums whose declaration order is the
//! distribution's release sequence, so the derived `Ord` is the
//! comparison used for release gating.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Epoch-less package version: `1:2014.1-0ubuntu1` -> (`2014`, `1`)
static PACKAGE_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+:)?(\d+)(?:\.(\d+))?").expect("package version regex is valid")
});

/// OpenStack release codenames in release order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpenStackRelease {
    Diablo,
    Essex,
    Folsom,
    Grizzly,
    Havana,
    Icehouse,
    Juno,
    Kilo,
    Liberty,
    Mitaka,
    Newton,
    Ocata,
    Pike,
    Queens,
}

impl OpenStackRelease {
    /// Every known release, oldest first
    pub const ALL: [OpenStackRelease; 14] = [
        Self::Diablo,
        Self::Essex,
        Self::Folsom,
        Self::Grizzly,
        Self::Havana,
        Self::Icehouse,
        Self::Juno,
        Self::Kilo,
        Self::Liberty,
        Self::Mitaka,
        Self::Newton,
        Self::Ocata,
        Self::Pike,
        Self::Queens,
    ];

    /// Lowercase codename
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diablo => "diablo",
            Self::Essex => "essex",
            Self::Folsom => "folsom",
            Self::Grizzly => "grizzly",
            Self::Havana => "havana",
            Self::Icehouse => "icehouse",
            Self::Juno => "juno",
            Self::Kilo => "kilo",
            Self::Liberty => "liberty",
            Self::Mitaka => "mitaka",
            Self::Newton => "newton",
            Self::Ocata => "ocata",
            Self::Pike => "pike",
            Self::Queens => "queens",
        }
    }

    /// This release and every older one, newest first.
    ///
    /// Used for template lookup, which falls back through older release
    /// directories when a template was not changed for the bound release.
    pub fn and_older(&self) -> impl Iterator<Item = OpenStackRelease> {
        let current = *self;
        Self::ALL.into_iter().rev().filter(move |r| *r <= current)
    }

    /// Map a neutron package version to its release.
    ///
    /// Date-based versions (`2014.1`) were used up to kilo; neutron switched
    /// to semantic versions starting at 7 for liberty.
    pub fn from_package_version(version: &str) -> Option<Self> {
        let caps = PACKAGE_VERSION_RE.captures(version.trim())?;
        let major: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minor: Option<u32> = caps.get(2).and_then(|m| m.as_str().parse().ok());

        match (major, minor) {
            (2011, Some(3)) => Some(Self::Diablo),
            (2012, Some(1)) => Some(Self::Essex),
            (2012, Some(2)) => Some(Self::Folsom),
            (2013, Some(1)) => Some(Self::Grizzly),
            (2013, Some(2)) => Some(Self::Havana),
            (2014, Some(1)) => Some(Self::Icehouse),
            (2014, Some(2)) => Some(Self::Juno),
            (2015, Some(1)) => Some(Self::Kilo),
            (7, _) => Some(Self::Liberty),
            (8, _) => Some(Self::Mitaka),
            (9, _) => Some(Self::Newton),
            (10, _) => Some(Self::Ocata),
            (11, _) => Some(Self::Pike),
            (12, _) => Some(Self::Queens),
            _ => None,
        }
    }
}

impl fmt::Display for OpenStackRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OpenStackRelease {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == name)
            .ok_or_else(|| Error::unknown_release(s))
    }
}

/// Ubuntu series codenames in release order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UbuntuSeries {
    Lucid,
    Maverick,
    Natty,
    Oneiric,
    Precise,
    Quantal,
    Raring,
    Saucy,
    Trusty,
    Utopic,
    Vivid,
    Wily,
    Xenial,
    Yakkety,
    Zesty,
    Artful,
    Bionic,
}

impl UbuntuSeries {
    /// Every known series, oldest first
    pub const ALL: [UbuntuSeries; 17] = [
        Self::Lucid,
        Self::Maverick,
        Self::Natty,
        Self::Oneiric,
        Self::Precise,
        Self::Quantal,
        Self::Raring,
        Self::Saucy,
        Self::Trusty,
        Self::Utopic,
        Self::Vivid,
        Self::Wily,
        Self::Xenial,
        Self::Yakkety,
        Self::Zesty,
        Self::Artful,
        Self::Bionic,
    ];

    /// Lowercase codename
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lucid => "lucid",
            Self::Maverick => "maverick",
            Self::Natty => "natty",
            Self::Oneiric => "oneiric",
            Self::Precise => "precise",
            Self::Quantal => "quantal",
            Self::Raring => "raring",
            Self::Saucy => "saucy",
            Self::Trusty => "trusty",
            Self::Utopic => "utopic",
            Self::Vivid => "vivid",
            Self::Wily => "wily",
            Self::Xenial => "xenial",
            Self::Yakkety => "yakkety",
            Self::Zesty => "zesty",
            Self::Artful => "artful",
            Self::Bionic => "bionic",
        }
    }

    /// OpenStack release shipped in the series' own archive
    pub fn distro_release(&self) -> Option<OpenStackRelease> {
        match self {
            Self::Lucid | Self::Maverick | Self::Natty => None,
            Self::Oneiric => Some(OpenStackRelease::Diablo),
            Self::Precise => Some(OpenStackRelease::Essex),
            Self::Quantal => Some(OpenStackRelease::Folsom),
            Self::Raring => Some(OpenStackRelease::Grizzly),
            Self::Saucy => Some(OpenStackRelease::Havana),
            Self::Trusty => Some(OpenStackRelease::Icehouse),
            Self::Utopic => Some(OpenStackRelease::Juno),
            Self::Vivid => Some(OpenStackRelease::Kilo),
            Self::Wily => Some(OpenStackRelease::Liberty),
            Self::Xenial => Some(OpenStackRelease::Mitaka),
            Self::Yakkety => Some(OpenStackRelease::Newton),
            Self::Zesty => Some(OpenStackRelease::Ocata),
            Self::Artful => Some(OpenStackRelease::Pike),
            Self::Bionic => Some(OpenStackRelease::Queens),
        }
    }
}

impl fmt::Display for UbuntuSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UbuntuSeries {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == name)
            .ok_or_else(|| Error::unknown_series(s))
    }
}

/// Where packages are installed from (the `openstack-origin` option)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallSource {
    /// The series' own archive
    Distro,
    /// The series' own archive plus its -proposed pocket
    DistroProposed,
    /// Ubuntu Cloud Archive, e.g. `cloud:trusty-kilo` or `cloud:trusty-kilo/proposed`
    CloudArchive {
        series: UbuntuSeries,
        release: OpenStackRelease,
        proposed: bool,
    },
    /// Launchpad PPA
    Ppa(String),
    /// Raw apt line or repository URL
    Deb(String),
}

impl InstallSource {
    /// Parse an install source string
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.trim();
        match source {
            "distro" => return Ok(Self::Distro),
            "distro-proposed" => return Ok(Self::DistroProposed),
            _ => {}
        }

        if let Some(pocket) = source.strip_prefix("cloud:") {
            return Self::parse_cloud_archive(source, pocket);
        }
        if source.starts_with("ppa:") {
            return Ok(Self::Ppa(source.to_string()));
        }
        if source.starts_with("deb") || source.starts_with("http") {
            return Ok(Self::Deb(source.to_string()));
        }

        Err(Error::unknown_source(source))
    }

    /// Accepts `trusty-kilo`, `trusty-kilo/updates`, `trusty-kilo/proposed`,
    /// `trusty-updates/kilo` and `trusty-proposed/kilo`.
    fn parse_cloud_archive(source: &str, pocket: &str) -> Result<Self> {
        let (series, rest) = pocket
            .split_once('-')
            .ok_or_else(|| Error::unknown_source(source))?;
        let series: UbuntuSeries = series.parse()?;

        let (release, proposed) = match rest.split_once('/') {
            Some(("updates", rel)) => (rel, false),
            Some(("proposed", rel)) => (rel, true),
            Some((rel, "updates")) => (rel, false),
            Some((rel, "proposed")) => (rel, true),
            Some(_) => return Err(Error::unknown_source(source)),
            None => (rest, false),
        };

        Ok(Self::CloudArchive {
            series,
            release: release.parse()?,
            proposed,
        })
    }

    /// OpenStack release this source provides on `series`.
    ///
    /// PPA and deb sources are matched by the first release codename
    /// they contain; `None` when nothing matches.
    pub fn release(&self, series: UbuntuSeries) -> Result<Option<OpenStackRelease>> {
        match self {
            Self::Distro | Self::DistroProposed => series
                .distro_release()
                .map(Some)
                .ok_or_else(|| Error::NoDistroRelease {
                    series: series.to_string(),
                }),
            Self::CloudArchive { release, .. } => Ok(Some(*release)),
            Self::Ppa(src) | Self::Deb(src) => Ok(OpenStackRelease::ALL
                .into_iter()
                .find(|r| src.contains(r.as_str()))),
        }
    }
}
