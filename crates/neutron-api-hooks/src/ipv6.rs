//! IPv6 support prerequisites

use crate::charm::NeutronApi;
use crate::error::HookError;
use anyhow::Result;
use neutron_api_core::UbuntuSeries;
use tracing::{debug, info};

const TRUSTY_BACKPORTS: &str = "deb http://archive.ubuntu.com/ubuntu trusty-backports main";

impl NeutronApi {
    /// Prepare the unit for IPv6 addressing.
    ///
    /// haproxy needs 1.5.3 or later for IPv6 backends; on trusty that
    /// comes from trusty-backports, later series ship it.
    ///
    /// A codename missing from the series table is newer than any known
    /// series and already ships a capable haproxy.
    pub fn setup_ipv6(&self) -> Result<()> {
        let codename = self.host().lsb_codename()?;
        let Ok(series) = codename.parse::<UbuntuSeries>() else {
            debug!(
                series = %codename,
                "Series newer than the series table, nothing to set up for IPv6"
            );
            return Ok(());
        };
        if series < UbuntuSeries::Trusty {
            return Err(HookError::UnsupportedSeries {
                feature: "IPv6".to_string(),
                series: series.to_string(),
                minimum: UbuntuSeries::Trusty.to_string(),
            }
            .into());
        }

        if series == UbuntuSeries::Trusty {
            info!("Installing haproxy from trusty-backports for IPv6 support");
            self.packages().add_source(TRUSTY_BACKPORTS)?;
            self.packages().update(false)?;
            self.packages()
                .install(&["haproxy/trusty-backports".to_string()], &[])?;
        }
        Ok(())
    }
}
