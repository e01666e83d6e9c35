//! Capability Probing and Block SID Tests
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use patina_tcg_core::discovery::{
    DataRemovalMechanism, FEATURE_CODE_BLOCK_SID, FEATURE_CODE_DATA_REMOVAL, FEATURE_CODE_ENTERPRISE,
    FEATURE_CODE_LOCKING, FeatureDescriptor, FeatureHeader,
};
use patina_tcg_opal::{
    MethodStatus, OpalDiskSupportAttribute, OpalSession, TcgError, device_locked, feature_enabled, feature_supported,
    uid,
};

use crate::opal_integration::common::*;

#[test]
fn test_opal2_attributes() {
    init_logger();
    let tper = SimulatedTper::opal2();
    let stall = RecordingStall::default();

    // The base ComID is not known yet, so the probe runs on a session addressing ComID 0.
    let probe = OpalSession::new(&tper, &stall, 0, 0);
    let (attributes, com_id) = probe.supported_attributes_info().unwrap();

    assert_eq!(com_id, COM_ID);
    assert_eq!(
        attributes,
        OpalDiskSupportAttribute {
            sp1: true,
            sp2: true,
            opal_ssc2: true,
            block_sid: true,
            media_encryption: true,
            initial_cpin_sid_is_msid: true,
            cpin_upon_revert: true,
            ..Default::default()
        }
    );
    assert!(feature_supported(&attributes));
    assert_eq!(stall.count.get(), 0);
}

#[test]
fn test_pyrite2_attributes_and_data_removal_estimate() {
    init_logger();
    let tper = SimulatedTper::pyrite2();
    let stall = RecordingStall::default();
    let probe = OpalSession::new(&tper, &stall, 0, 0);

    let (attributes, com_id) = probe.supported_attributes_info().unwrap();
    assert_eq!(com_id, COM_ID);
    assert!(attributes.pyrite_ssc_v2 && attributes.data_removal);
    assert!(!attributes.opal_ssc2 && !attributes.media_encryption);
    assert!(feature_supported(&attributes));

    let mut buffer = [0u8; 64];
    let size = probe.feature_descriptor(FEATURE_CODE_DATA_REMOVAL, &mut buffer).unwrap();
    assert_eq!(size, FeatureHeader::SIZE + 32);
    let Ok(FeatureDescriptor::DataRemoval(data_removal)) =
        FeatureDescriptor::decode(FEATURE_CODE_DATA_REMOVAL, &buffer[FeatureHeader::SIZE..size])
    else {
        panic!("not a data removal descriptor");
    };
    assert_eq!(data_removal.supported_mechanisms, 0b0000_0110);
    assert_eq!(data_removal.estimated_time_seconds(DataRemovalMechanism::CryptographicErase), Some(30 * 2 * 60));
}

#[test]
fn test_feature_descriptor_buffer_and_absence() {
    init_logger();
    let tper = SimulatedTper::opal2();
    let stall = RecordingStall::default();
    let probe = OpalSession::new(&tper, &stall, 0, 0);

    let mut small = [0xAAu8; 8];
    assert_eq!(
        probe.feature_descriptor(FEATURE_CODE_LOCKING, &mut small),
        Err(TcgError::BufferTooSmall { required: FeatureHeader::SIZE + 12 })
    );
    assert!(small.iter().all(|b| *b == 0xAA));

    let mut buffer = [0u8; 32];
    assert_eq!(probe.feature_descriptor(FEATURE_CODE_LOCKING, &mut buffer), Ok(16));
    assert_eq!(&buffer[..4], &[0x00, 0x02, 0x10, 12]);

    assert_eq!(probe.feature_descriptor(FEATURE_CODE_ENTERPRISE, &mut buffer), Err(TcgError::Failure));
}

#[test]
fn test_locking_predicates_follow_device_state() {
    init_logger();
    let tper = SimulatedTper::opal2();
    let stall = RecordingStall::default();
    let probe = OpalSession::new(&tper, &stall, 0, 0);
    let (attributes, _) = probe.supported_attributes_info().unwrap();

    let locking = probe.locking_info().unwrap();
    assert!(locking.flags.locking_supported());
    assert!(!feature_enabled(&attributes, &locking));

    take_ownership(&tper, &stall, b"owner");
    let locking = probe.locking_info().unwrap();
    assert!(feature_enabled(&attributes, &locking));
    assert!(!device_locked(&attributes, &locking));

    let session = open(&tper, &stall, uid::LOCKING_SP, uid::AUTHORITY_LOCKING_SP_ADMIN1, b"owner");
    assert_eq!(session.update_global_locking_range(true, true), Ok(MethodStatus::SUCCESS));
    session.end_session().unwrap();

    let locking = probe.locking_info().unwrap();
    assert!(device_locked(&attributes, &locking));
}

#[test]
fn test_feature_supported_requires_protocol_one() {
    init_logger();
    let tper = SimulatedTper::opal2();
    tper.state.borrow_mut().protocols = vec![0x00, 0x02];
    let stall = RecordingStall::default();
    let probe = OpalSession::new(&tper, &stall, 0, 0);

    let (attributes, com_id) = probe.supported_attributes_info().unwrap();
    assert!(!attributes.sp1);
    assert!(attributes.opal_ssc2);
    assert_eq!(com_id, COM_ID);
    assert!(!feature_supported(&attributes));
}

#[test]
fn test_block_sid_blocks_sid_authentication() {
    init_logger();
    let tper = SimulatedTper::opal2();
    let stall = RecordingStall::default();
    let session = OpalSession::new(&tper, &stall, 0, COM_ID);

    session.block_sid(true).unwrap();
    assert_eq!(tper.state.borrow().block_sid_requests, vec![[0x01, 0x00]]);

    let (attributes, _) = session.supported_attributes_info().unwrap();
    assert!(attributes.block_sid);

    let mut buffer = [0u8; 32];
    let size = session.feature_descriptor(FEATURE_CODE_BLOCK_SID, &mut buffer).unwrap();
    let Ok(FeatureDescriptor::BlockSid(block_sid)) =
        FeatureDescriptor::decode(FEATURE_CODE_BLOCK_SID, &buffer[FeatureHeader::SIZE..size])
    else {
        panic!("not a Block SID descriptor");
    };
    assert!(block_sid.state.sid_blocked_state());
    assert!(block_sid.clear_events.hardware_reset());

    let mut session = OpalSession::new(&tper, &stall, 0, COM_ID);
    assert_eq!(
        session.start_session(uid::ADMIN_SP, true, Some(MSID), Some(uid::AUTHORITY_SID)),
        Ok(MethodStatus::NOT_AUTHORIZED)
    );
    assert_eq!(session.tper_session_id(), None);
}
