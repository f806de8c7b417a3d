//! # Site Identity
//!
//! [`SiteData`] carries the per-site identity advertised by the TSCC: the
//! site model class, network and site IDs, the registration-required flag and
//! whether the site is currently linked to a peer network. The model class
//! decides how many bits of the short-LC identity word the network and site
//! IDs occupy.

use serde::Deserialize;

/// Tier-III site model classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteModel {
    Tiny,
    Small,
    Large,
    Huge,
}

impl SiteModel {
    pub fn as_bits(self) -> u32 {
        match self {
            SiteModel::Tiny => 0,
            SiteModel::Small => 1,
            SiteModel::Large => 2,
            SiteModel::Huge => 3,
        }
    }

    /// Bit widths of (net ID, site ID) under this model.
    pub fn id_widths(self) -> (u32, u32) {
        match self {
            SiteModel::Tiny => (9, 3),
            SiteModel::Small => (7, 5),
            SiteModel::Large => (5, 7),
            SiteModel::Huge => (2, 10),
        }
    }
}

/// Per-site identity shared by both slots and the CSBK encoder.
#[derive(Debug, Clone, Copy)]
pub struct SiteData {
    site_model: SiteModel,
    net_id: u16,
    site_id: u16,
    require_reg: bool,
    net_active: bool,
}

impl Default for SiteData {
    fn default() -> Self {
        SiteData {
            site_model: SiteModel::Small,
            net_id: 1,
            site_id: 1,
            require_reg: false,
            net_active: false,
        }
    }
}

impl SiteData {
    /// Creates site data, clamping the IDs to the widths the model allows.
    pub fn new(site_model: SiteModel, net_id: u16, site_id: u16, require_reg: bool) -> Self {
        let (net_bits, site_bits) = site_model.id_widths();
        SiteData {
            site_model,
            net_id: net_id & ((1 << net_bits) - 1),
            site_id: site_id.max(1) & ((1 << site_bits) - 1),
            require_reg,
            net_active: false,
        }
    }

    pub fn site_model(&self) -> SiteModel {
        self.site_model
    }

    pub fn net_id(&self) -> u16 {
        self.net_id
    }

    pub fn site_id(&self) -> u16 {
        self.site_id
    }

    pub fn require_reg(&self) -> bool {
        self.require_reg
    }

    pub fn net_active(&self) -> bool {
        self.net_active
    }

    pub fn set_net_active(&mut self, active: bool) {
        self.net_active = active;
    }

    /// Packs the model + network ID + site ID system identity field (14 bits).
    pub fn system_identity(&self) -> u32 {
        let (net_bits, site_bits) = self.site_model.id_widths();
        let mut value = self.site_model.as_bits();
        value = (value << net_bits) | u32::from(self.net_id);
        value = (value << site_bits) | u32::from(self.site_id);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_widths() {
        for model in [SiteModel::Tiny, SiteModel::Small, SiteModel::Large, SiteModel::Huge] {
            let (n, s) = model.id_widths();
            assert_eq!(n + s, 12);
        }
    }

    #[test]
    fn test_system_identity_packing() {
        let site = SiteData::new(SiteModel::Small, 0x23, 0x05, true);
        // 2 bits model, 7 bits net, 5 bits site
        assert_eq!(site.system_identity(), (1 << 12) | (0x23 << 5) | 0x05);
    }

    #[test]
    fn test_id_clamping() {
        let site = SiteData::new(SiteModel::Tiny, 0xFFFF, 0xFFFF, false);
        assert_eq!(site.net_id(), 0x1FF);
        assert_eq!(site.site_id(), 0x7);
    }
}
