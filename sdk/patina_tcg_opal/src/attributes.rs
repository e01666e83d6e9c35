//! Drive capability probing.
//!
//! The probes need no session. They read the supported security protocol list and the Level 0 Discovery data
//! through the session's transport, so an [`OpalSession`] created with any ComID (0 included) can run them before
//! the drive's base ComID is known.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use patina_tcg_core::{
    Result, TcgError,
    discovery::{
        FEATURE_CODE_LOCKING, FeatureDescriptor, LEVEL0_DISCOVERY_COM_ID, Level0Discovery, LockingFeature,
        SECURITY_PROTOCOL_IEEE1667, SECURITY_PROTOCOL_INFORMATION, SECURITY_PROTOCOL_TCG1, SECURITY_PROTOCOL_TCG2,
        SupportedProtocols,
    },
};

use crate::{BUFFER_SIZE, session::OpalSession};

/// SP-specific value of the supported security protocol list.
const SUPPORTED_PROTOCOL_LIST: u16 = 0x0000;

/// Security capabilities of a drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpalDiskSupportAttribute {
    /// TCG security protocol 0x01 supported.
    pub sp1: bool,
    /// TCG security protocol 0x02 supported.
    pub sp2: bool,
    pub sp_ieee1667: bool,
    pub enterprise: bool,
    pub opal_ssc1: bool,
    pub opal_ssc2: bool,
    pub opal_ssc_lite: bool,
    pub pyrite_ssc: bool,
    pub pyrite_ssc_v2: bool,
    pub block_sid: bool,
    pub data_removal: bool,
    pub media_encryption: bool,
    /// The initial C_PIN_SID PIN is the MSID.
    pub initial_cpin_sid_is_msid: bool,
    /// C_PIN_SID PIN reverts to the MSID on revert.
    pub cpin_upon_revert: bool,
}

/// True if the drive implements an Opal or Pyrite SSC over security protocol 0x01.
///
/// Enterprise SSC drives are not supported.
pub fn feature_supported(attributes: &OpalDiskSupportAttribute) -> bool {
    attributes.sp1
        && (attributes.opal_ssc1
            || attributes.opal_ssc2
            || attributes.opal_ssc_lite
            || attributes.pyrite_ssc
            || attributes.pyrite_ssc_v2)
}

/// True if the drive is supported and locking is supported and enabled.
pub fn feature_enabled(attributes: &OpalDiskSupportAttribute, locking: &LockingFeature) -> bool {
    feature_supported(attributes) && locking.flags.locking_supported() && locking.flags.locking_enabled()
}

/// True if locking is enabled and some range is currently locked.
pub fn device_locked(attributes: &OpalDiskSupportAttribute, locking: &LockingFeature) -> bool {
    feature_enabled(attributes, locking) && locking.flags.locked()
}

/// SSC descriptor fields that identify the ComID and C_PIN_SID behaviour.
struct SscIdentity {
    base_com_id: u16,
    initial_cpin_sid_indicator: Option<u8>,
    cpin_sid_revert_behavior: Option<u8>,
}

/// Order in which SSC descriptors may supply the base ComID.
fn ssc_rank(feature: &FeatureDescriptor) -> Option<u8> {
    Some(match feature {
        FeatureDescriptor::OpalV2(_) => 0,
        FeatureDescriptor::OpalLite(_) => 1,
        FeatureDescriptor::OpalV1(_) => 2,
        FeatureDescriptor::PyriteV2(_) => 3,
        FeatureDescriptor::PyriteV1(_) => 4,
        _ => return None,
    })
}

impl OpalSession<'_> {
    /// Reads the supported security protocol list into `buffer`.
    pub fn supported_protocols<'b>(&self, buffer: &'b mut [u8]) -> Result<SupportedProtocols<'b>> {
        self.transport.trusted_recv(SECURITY_PROTOCOL_INFORMATION, SUPPORTED_PROTOCOL_LIST, buffer, 0)?;
        SupportedProtocols::parse(buffer)
    }

    /// Reads the Level 0 Discovery data into `buffer`.
    pub fn level0_discovery<'b>(&self, buffer: &'b mut [u8]) -> Result<Level0Discovery<'b>> {
        self.transport.trusted_recv(SECURITY_PROTOCOL_TCG1, LEVEL0_DISCOVERY_COM_ID, buffer, 0)?;
        Level0Discovery::parse(buffer)
    }

    /// Probes the drive's capabilities and returns them with the base ComID of its SSC (0 if none is advertised).
    ///
    /// When several SSC descriptors are present, the first one with a non-zero base ComID in the order Opal 2.0,
    /// Opal Lite, Opal 1.0, Pyrite 2.0, Pyrite 1.0 provides the ComID and the C_PIN_SID indicators.
    pub fn supported_attributes_info(&self) -> Result<(OpalDiskSupportAttribute, u16)> {
        let mut attributes = OpalDiskSupportAttribute::default();

        let mut buffer = [0u8; BUFFER_SIZE];
        let protocols = self.supported_protocols(&mut buffer)?;
        attributes.sp1 = protocols.contains(SECURITY_PROTOCOL_TCG1);
        attributes.sp2 = protocols.contains(SECURITY_PROTOCOL_TCG2);
        attributes.sp_ieee1667 = protocols.contains(SECURITY_PROTOCOL_IEEE1667);

        let mut buffer = [0u8; BUFFER_SIZE];
        let discovery = self.level0_discovery(&mut buffer)?;

        let mut identity: Option<(u8, SscIdentity)> = None;
        for feature in discovery.features() {
            let candidate = match feature {
                FeatureDescriptor::Enterprise(_) => {
                    attributes.enterprise = true;
                    None
                }
                FeatureDescriptor::OpalV1(ssc) => {
                    attributes.opal_ssc1 = true;
                    Some(SscIdentity {
                        base_com_id: ssc.base_com_id,
                        initial_cpin_sid_indicator: None,
                        cpin_sid_revert_behavior: None,
                    })
                }
                FeatureDescriptor::OpalV2(opal) => {
                    attributes.opal_ssc2 = true;
                    Some(SscIdentity {
                        base_com_id: opal.base_com_id,
                        initial_cpin_sid_indicator: Some(opal.initial_cpin_sid_indicator),
                        cpin_sid_revert_behavior: Some(opal.cpin_sid_revert_behavior),
                    })
                }
                FeatureDescriptor::OpalLite(pyrite)
                | FeatureDescriptor::PyriteV1(pyrite)
                | FeatureDescriptor::PyriteV2(pyrite) => {
                    match feature {
                        FeatureDescriptor::OpalLite(_) => attributes.opal_ssc_lite = true,
                        FeatureDescriptor::PyriteV1(_) => attributes.pyrite_ssc = true,
                        _ => attributes.pyrite_ssc_v2 = true,
                    }
                    Some(SscIdentity {
                        base_com_id: pyrite.base_com_id,
                        initial_cpin_sid_indicator: Some(pyrite.initial_cpin_sid_indicator),
                        cpin_sid_revert_behavior: Some(pyrite.cpin_sid_revert_behavior),
                    })
                }
                FeatureDescriptor::Locking(locking) => {
                    attributes.media_encryption = locking.flags.media_encryption();
                    None
                }
                FeatureDescriptor::BlockSid(_) => {
                    attributes.block_sid = true;
                    None
                }
                FeatureDescriptor::DataRemoval(_) => {
                    attributes.data_removal = true;
                    None
                }
                _ => None,
            };

            let (Some(candidate), Some(rank)) = (candidate, ssc_rank(&feature)) else {
                continue;
            };
            if candidate.base_com_id == 0 {
                log::debug!(target: "tcg_opal", "Feature {:#06X} advertises a reserved base ComID", feature.code());
                continue;
            }
            let better = match &identity {
                Some((best, _)) => rank < *best,
                None => true,
            };
            if better {
                identity = Some((rank, candidate));
            }
        }

        let mut base_com_id = 0;
        if let Some((_, identity)) = identity {
            base_com_id = identity.base_com_id;
            attributes.initial_cpin_sid_is_msid = identity.initial_cpin_sid_indicator == Some(0);
            attributes.cpin_upon_revert = identity.cpin_sid_revert_behavior == Some(0);
        }

        log::debug!(target: "tcg_opal", "Drive attributes {:?}, base ComID {:#06X}", attributes, base_com_id);
        Ok((attributes, base_com_id))
    }

    /// Copies the complete Level 0 descriptor (header included) of feature `code` into `buffer` and returns its size.
    pub fn feature_descriptor(&self, code: u16, buffer: &mut [u8]) -> Result<usize> {
        let mut discovery_buffer = [0u8; BUFFER_SIZE];
        let discovery = self.level0_discovery(&mut discovery_buffer)?;
        let Some(descriptor) = discovery.raw_descriptor(code) else {
            log::debug!(target: "tcg_opal", "Feature {:#06X} not reported", code);
            return Err(TcgError::Failure);
        };
        if descriptor.len() > buffer.len() {
            return Err(TcgError::BufferTooSmall { required: descriptor.len() });
        }
        buffer[..descriptor.len()].copy_from_slice(descriptor);
        Ok(descriptor.len())
    }

    /// Reads the Locking feature descriptor.
    pub fn locking_info(&self) -> Result<LockingFeature> {
        let mut buffer = [0u8; BUFFER_SIZE];
        match self.level0_discovery(&mut buffer)?.find(FEATURE_CODE_LOCKING) {
            Some(FeatureDescriptor::Locking(locking)) => Ok(locking),
            _ => {
                log::debug!(target: "tcg_opal", "No Locking feature reported");
                Err(TcgError::Failure)
            }
        }
    }
}
