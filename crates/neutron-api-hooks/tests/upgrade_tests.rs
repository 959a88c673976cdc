//! Upgrade sequencing and database migration

mod common;

use common::*;
use neutron_api_core::OpenStackRelease;
use neutron_api_hooks::renderer::Renderer;

const DPKG_OPTS: &str =
    "--option Dpkg::Options::=--force-confnew --option Dpkg::Options::=--force-confdef";

fn upgrade_charm(unit: &TestUnit, origin: &str, installed: &str) -> neutron_api_hooks::NeutronApi {
    unit.charm_with(
        state("ovs", origin),
        RecordingRunner::new(unit.log.clone()),
        RecordingPackageManager::new(unit.log.clone()).with_installed("neutron-server", installed),
    )
}

#[test]
fn test_icehouse_to_kilo_upgrade_order() {
    let unit = TestUnit::new();
    let charm = upgrade_charm(&unit, "cloud:trusty-kilo", "1:2014.1.3-0ubuntu1");
    let mut renderer = RecordingRenderer::new(unit.log.clone(), OpenStackRelease::Icehouse);

    charm.do_openstack_upgrade(&mut renderer).unwrap();

    let add_source = unit.log.position("add_source cloud:trusty-kilo");
    let update = unit.log.position("update fatal=true");
    let upgrade = unit.log.position("upgrade dist=true");
    let install = unit.log.position("install ");
    let set_release = unit.log.position("set_release kilo");
    let stamp = unit.log.position("run neutron-db-manage");
    assert!(add_source < update);
    assert!(update < upgrade);
    assert!(upgrade < install);
    assert!(install < set_release);
    assert!(set_release < stamp);

    assert_eq!(
        unit.log.matching("upgrade "),
        vec![format!("upgrade dist=true {}", DPKG_OPTS)]
    );
    assert_eq!(renderer.release(), OpenStackRelease::Kilo);

    assert_eq!(
        unit.log.matching("run neutron-db-manage"),
        vec![
            "run neutron-db-manage --config-file /etc/neutron/neutron.conf \
             --config-file /etc/neutron/plugins/ml2/ml2_conf.ini stamp icehouse"
                .to_string(),
            "run neutron-db-manage --config-file /etc/neutron/neutron.conf \
             --config-file /etc/neutron/plugins/ml2/ml2_conf.ini upgrade head"
                .to_string(),
        ]
    );
}

#[test]
fn test_upgrade_installs_sorted_kilo_package_set() {
    let unit = TestUnit::new();
    let charm = upgrade_charm(&unit, "cloud:trusty-kilo", "1:2014.1.3-0ubuntu1");
    let mut renderer = RecordingRenderer::new(unit.log.clone(), OpenStackRelease::Icehouse);

    charm.do_openstack_upgrade(&mut renderer).unwrap();

    let installs = unit.log.matching("install ");
    assert_eq!(installs.len(), 1);
    assert!(installs[0].ends_with(DPKG_OPTS));

    let packages = installed_packages(&installs[0]);
    let mut sorted = packages.clone();
    sorted.sort();
    assert_eq!(packages, sorted);
    assert!(packages.contains(&"python-neutron-lbaas".to_string()));
    assert!(packages.contains(&"neutron-server".to_string()));
}

#[test]
fn test_upgrade_to_juno_skips_migration() {
    let unit = TestUnit::new();
    let charm = upgrade_charm(&unit, "cloud:trusty-juno", "1:2014.1.3-0ubuntu1");
    let mut renderer = RecordingRenderer::new(unit.log.clone(), OpenStackRelease::Icehouse);

    charm.do_openstack_upgrade(&mut renderer).unwrap();

    assert_eq!(renderer.release(), OpenStackRelease::Juno);
    unit.log.assert_none("run neutron-db-manage");
}

#[test]
fn test_upgrade_to_icehouse_skips_migration() {
    let unit = TestUnit::new();
    let charm = upgrade_charm(&unit, "distro", "1:2013.2.3-0ubuntu1");
    let mut renderer = RecordingRenderer::new(unit.log.clone(), OpenStackRelease::Havana);

    charm.do_openstack_upgrade(&mut renderer).unwrap();

    assert_eq!(renderer.release(), OpenStackRelease::Icehouse);
    unit.log.assert_none("run neutron-db-manage");
}

#[test]
fn test_install_failure_aborts_before_rebinding() {
    let unit = TestUnit::new();
    let charm = unit.charm_with(
        state("ovs", "cloud:trusty-kilo"),
        RecordingRunner::new(unit.log.clone()),
        RecordingPackageManager::new(unit.log.clone())
            .with_installed("neutron-server", "1:2014.1.3-0ubuntu1")
            .failing_install(),
    );
    let mut renderer = RecordingRenderer::new(unit.log.clone(), OpenStackRelease::Icehouse);

    assert!(charm.do_openstack_upgrade(&mut renderer).is_err());
    assert_eq!(renderer.release(), OpenStackRelease::Icehouse);
    unit.log.assert_none("set_release");
    unit.log.assert_none("run neutron-db-manage");
}

#[test]
fn test_migration_failure_propagates() {
    let unit = TestUnit::new();
    let charm = unit.charm_with(
        state("ovs", "cloud:trusty-kilo"),
        RecordingRunner::new(unit.log.clone()).failing("neutron-db-manage"),
        RecordingPackageManager::new(unit.log.clone())
            .with_installed("neutron-server", "1:2014.1.3-0ubuntu1"),
    );
    let mut renderer = RecordingRenderer::new(unit.log.clone(), OpenStackRelease::Icehouse);

    let err = charm.do_openstack_upgrade(&mut renderer).unwrap_err();
    assert!(format!("{:#}", err).contains("stamp"));
    assert_eq!(unit.log.matching("run neutron-db-manage").len(), 1);
}
