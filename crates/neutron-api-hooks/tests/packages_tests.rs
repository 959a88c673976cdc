//! Package derivation across releases, plugins and install modes

mod common;

use common::*;
use neutron_api_core::OpenStackRelease;
use neutron_api_hooks::constants::{
    BASE_GIT_PACKAGES, BASE_PACKAGES, GIT_PACKAGE_BLACKLIST, GIT_PACKAGE_BLACKLIST_KILO,
    KILO_PACKAGES,
};
use neutron_api_hooks::HookError;

#[test]
fn test_distro_packages_on_icehouse() {
    let unit = TestUnit::new();
    let charm = unit.charm(state("ovs", "distro"));
    let packages = charm.determine_packages(None).unwrap();

    for package in BASE_PACKAGES {
        assert!(packages.contains(*package), "missing {}", package);
    }
    assert!(packages.contains("neutron-server"));
    assert!(packages.contains("neutron-plugin-ml2"));
    for package in KILO_PACKAGES {
        assert!(!packages.contains(*package));
    }
}

#[test]
fn test_kilo_origin_adds_kilo_packages() {
    let unit = TestUnit::new();
    let charm = unit.charm(state("ovs", "cloud:trusty-kilo"));
    let packages = charm.determine_packages(None).unwrap();

    for package in KILO_PACKAGES {
        assert!(packages.contains(*package));
    }
}

#[test]
fn test_calico_server_packages() {
    let unit = TestUnit::new();
    let charm = unit.charm(state("Calico", "distro"));
    let packages = charm.determine_packages(None).unwrap();

    assert!(packages.contains("calico-control"));
    assert!(packages.contains("etcd"));
    assert!(!packages.contains("neutron-plugin-ml2"));
}

#[test]
fn test_git_install_excludes_blacklist() {
    let unit = TestUnit::new();
    let charm = unit.charm(git_state("distro"));
    let packages = charm.determine_packages(None).unwrap();

    for package in BASE_GIT_PACKAGES {
        assert!(packages.contains(*package));
    }
    for package in GIT_PACKAGE_BLACKLIST {
        assert!(!packages.contains(*package), "{} should be blacklisted", package);
    }
}

#[test]
fn test_git_install_excludes_kilo_blacklist_from_kilo() {
    let unit = TestUnit::new();
    let charm = unit.charm(git_state("cloud:trusty-kilo"));
    let packages = charm.determine_packages(None).unwrap();

    for package in GIT_PACKAGE_BLACKLIST.iter().chain(GIT_PACKAGE_BLACKLIST_KILO) {
        assert!(!packages.contains(*package));
    }
    assert!(packages.contains("apache2"));
}

#[test]
fn test_blacklisted_package_missing_is_an_invariant_error() {
    // Calico does not pull in neutron-plugin-ml2, which the blacklist removes
    let unit = TestUnit::new();
    let mut git = git_state("distro");
    git.config.neutron_plugin = "Calico".to_string();
    let charm = unit.charm(git);

    let err = charm.determine_packages(None).unwrap_err();
    match err.downcast_ref::<HookError>() {
        Some(HookError::BlacklistInvariant { package }) => {
            assert_eq!(package, "neutron-plugin-ml2")
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_explicit_source_overrides_origin() {
    let unit = TestUnit::new();
    let charm = unit.charm(state("ovs", "distro"));

    let kilo = charm
        .determine_packages(Some(OpenStackRelease::Kilo.as_str()))
        .unwrap();
    assert!(kilo.contains("python-neutron-vpnaas"));
}

#[test]
fn test_os_release_from_installed_version() {
    let unit = TestUnit::new();
    let charm = unit.charm_with(
        state("ovs", "cloud:trusty-kilo"),
        RecordingRunner::new(unit.log.clone()),
        RecordingPackageManager::new(unit.log.clone())
            .with_installed("neutron-server", "1:2014.2.3-0ubuntu1"),
    );

    assert_eq!(
        charm.os_release("neutron-server").unwrap(),
        OpenStackRelease::Juno
    );
}

#[test]
fn test_install_adds_origin_then_installs() {
    let unit = TestUnit::new();
    let charm = unit.charm(state("ovs", "cloud:trusty-kilo"));

    charm.install().unwrap();

    let add_source = unit.log.position("add_source cloud:trusty-kilo");
    let update = unit.log.position("update fatal=true");
    let install = unit.log.position("install ");
    assert!(add_source < update);
    assert!(update < install);

    let installs = unit.log.matching("install ");
    assert!(installs[0].ends_with("--option=Dpkg::Options::=--force-confold"));
    let packages = installed_packages(&installs[0]);
    assert!(packages.contains(&"neutron-server".to_string()));
    assert!(packages.contains(&"python-neutron-fwaas".to_string()));
    unit.log.assert_none("run getent");
}

#[test]
fn test_setup_ipv6_on_trusty_uses_backports() {
    let unit = TestUnit::new();
    let charm = unit.charm(state("ovs", "distro"));

    charm.setup_ipv6().unwrap();

    assert_eq!(
        unit.log.events(),
        vec![
            "add_source deb http://archive.ubuntu.com/ubuntu trusty-backports main",
            "update fatal=false",
            "install haproxy/trusty-backports | ",
        ]
    );
}

#[test]
fn test_setup_ipv6_after_trusty_is_a_noop() {
    let unit = TestUnit::with_series("xenial");
    let charm = unit.charm(state("ovs", "distro"));

    charm.setup_ipv6().unwrap();
    assert!(unit.log.events().is_empty());
}

#[test]
fn test_setup_ipv6_on_series_newer_than_table_is_a_noop() {
    let unit = TestUnit::with_series("focal");
    let charm = unit.charm(state("ovs", "distro"));

    charm.setup_ipv6().unwrap();
    assert!(unit.log.events().is_empty());
}

#[test]
fn test_setup_ipv6_before_trusty_is_unsupported() {
    let unit = TestUnit::with_series("precise");
    let charm = unit.charm(state("ovs", "distro"));

    let err = charm.setup_ipv6().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HookError>(),
        Some(HookError::UnsupportedSeries { .. })
    ));
    assert!(unit.log.events().is_empty());
}
