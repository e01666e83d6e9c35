//! Level 0 Discovery and security protocol information decoding.
//!
//! Level 0 Discovery data (security protocol 0x01, ComID 0x0001) is a 48 byte header followed by feature
//! descriptors. Each descriptor starts with a big-endian feature code, a version byte and the number of bytes that
//! follow. [`Level0Discovery`] walks the descriptors and decodes the ones the Opal library uses into
//! [`FeatureDescriptor`] variants; anything else is surfaced as [`FeatureDescriptor::Unknown`].
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
use bitfield_struct::bitfield;
use scroll::{Pread, ctx::TryFromCtx};

use crate::error::{Result, TcgError};

/// Security protocol returning the list of supported protocols and certificates.
pub const SECURITY_PROTOCOL_INFORMATION: u8 = 0x00;
/// TCG security protocol 1: Level 0 Discovery and session traffic.
pub const SECURITY_PROTOCOL_TCG1: u8 = 0x01;
/// TCG security protocol 2: ComID management and TPer reset related requests such as Block SID.
pub const SECURITY_PROTOCOL_TCG2: u8 = 0x02;
pub const SECURITY_PROTOCOL_IEEE1667: u8 = 0xEE;

/// ComID used to retrieve Level 0 Discovery data.
pub const LEVEL0_DISCOVERY_COM_ID: u16 = 0x0001;

pub const FEATURE_CODE_TPER: u16 = 0x0001;
pub const FEATURE_CODE_LOCKING: u16 = 0x0002;
pub const FEATURE_CODE_GEOMETRY: u16 = 0x0003;
pub const FEATURE_CODE_ENTERPRISE: u16 = 0x0100;
pub const FEATURE_CODE_OPAL_SSC_V1: u16 = 0x0200;
pub const FEATURE_CODE_SINGLE_USER_MODE: u16 = 0x0201;
pub const FEATURE_CODE_DATASTORE: u16 = 0x0202;
pub const FEATURE_CODE_OPAL_SSC_V2: u16 = 0x0203;
pub const FEATURE_CODE_OPAL_SSC_LITE: u16 = 0x0301;
pub const FEATURE_CODE_PYRITE_SSC: u16 = 0x0302;
pub const FEATURE_CODE_PYRITE_SSC_V2: u16 = 0x0303;
pub const FEATURE_CODE_BLOCK_SID: u16 = 0x0402;
pub const FEATURE_CODE_DATA_REMOVAL: u16 = 0x0404;

/// Level 0 Discovery header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Level0Header {
    /// Number of bytes following this field, descriptors included.
    pub length: u32,
    pub revision: u32,
}

impl Level0Header {
    /// Size of the header on the wire.
    pub const SIZE: usize = 48;
}

impl TryFromCtx<'_, scroll::Endian> for Level0Header {
    type Error = scroll::Error;

    fn try_from_ctx(from: &[u8], ctx: scroll::Endian) -> core::result::Result<(Self, usize), Self::Error> {
        if from.len() < Self::SIZE {
            return Err(scroll::Error::TooBig { size: Self::SIZE, len: from.len() });
        }
        let mut offset = 0;
        let length = from.gread_with(&mut offset, ctx)?;
        let revision = from.gread_with(&mut offset, ctx)?;
        // Reserved and vendor specific bytes.
        Ok((Level0Header { length, revision }, Self::SIZE))
    }
}

/// Header common to every feature descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureHeader {
    pub code: u16,
    /// Descriptor version, upper nibble of the version byte.
    pub version: u8,
    /// Number of descriptor bytes following this header.
    pub length: u8,
}

impl FeatureHeader {
    /// Size of the header on the wire.
    pub const SIZE: usize = 4;
}

impl TryFromCtx<'_, scroll::Endian> for FeatureHeader {
    type Error = scroll::Error;

    fn try_from_ctx(from: &[u8], ctx: scroll::Endian) -> core::result::Result<(Self, usize), Self::Error> {
        let mut offset = 0;
        let code = from.gread_with(&mut offset, ctx)?;
        let version: u8 = from.gread(&mut offset)?;
        let length = from.gread(&mut offset)?;
        Ok((FeatureHeader { code, version: version >> 4, length }, offset))
    }
}

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct TPerFlags {
    pub sync_supported: bool,
    pub async_supported: bool,
    pub ack_nak_supported: bool,
    pub buffer_management_supported: bool,
    pub streaming_supported: bool,
    #[bits(1)]
    __: u8,
    pub com_id_management_supported: bool,
    #[bits(1)]
    __: u8,
}

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct LockingFlags {
    pub locking_supported: bool,
    pub locking_enabled: bool,
    pub locked: bool,
    pub media_encryption: bool,
    pub mbr_enabled: bool,
    pub mbr_done: bool,
    pub mbr_shadowing_not_supported: bool,
    #[bits(1)]
    __: u8,
}

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct BlockSidState {
    /// C_PIN_SID PIN still equals C_PIN_MSID PIN.
    pub sid_value_state: bool,
    /// SID authentication is currently blocked.
    pub sid_blocked_state: bool,
    #[bits(6)]
    __: u8,
}

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct BlockSidClearEvents {
    pub hardware_reset: bool,
    #[bits(7)]
    __: u8,
}

/// TPer feature (0x0001).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TPerFeature {
    pub flags: TPerFlags,
}

/// Locking feature (0x0002).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockingFeature {
    pub flags: LockingFlags,
}

/// Geometry reporting feature (0x0003).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryFeature {
    pub align_required: bool,
    pub logical_block_size: u32,
    pub alignment_granularity: u64,
    pub lowest_aligned_lba: u64,
}

/// ComID range advertised by the Enterprise and Opal 1.0 SSC features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SscFeature {
    pub base_com_id: u16,
    pub number_com_ids: u16,
    pub range_crossing: bool,
}

/// Opal SSC 2.0 feature (0x0203).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpalV2Feature {
    pub base_com_id: u16,
    pub number_com_ids: u16,
    pub range_crossing: bool,
    pub number_locking_admin_authorities: u16,
    pub number_locking_user_authorities: u16,
    /// 0x00 when the initial C_PIN_SID PIN is the C_PIN_MSID PIN.
    pub initial_cpin_sid_indicator: u8,
    /// 0x00 when C_PIN_SID PIN reverts to the C_PIN_MSID PIN.
    pub cpin_sid_revert_behavior: u8,
}

/// Opal Lite, Pyrite 1.0 and Pyrite 2.0 SSC features share one layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyriteFeature {
    pub base_com_id: u16,
    pub number_com_ids: u16,
    pub initial_cpin_sid_indicator: u8,
    pub cpin_sid_revert_behavior: u8,
}

/// Block SID authentication feature (0x0402).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSidFeature {
    pub state: BlockSidState,
    pub clear_events: BlockSidClearEvents,
}

/// Data removal mechanisms of the Supported Data Removal Mechanism table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataRemovalMechanism {
    OverwriteDataErase = 0,
    BlockErase = 1,
    CryptographicErase = 2,
    Unmap = 3,
    ResetWritePointers = 4,
    VendorSpecificErase = 5,
}

impl TryFrom<u64> for DataRemovalMechanism {
    type Error = TcgError;

    fn try_from(value: u64) -> Result<Self> {
        Ok(match value {
            0 => Self::OverwriteDataErase,
            1 => Self::BlockErase,
            2 => Self::CryptographicErase,
            3 => Self::Unmap,
            4 => Self::ResetWritePointers,
            5 => Self::VendorSpecificErase,
            _ => return Err(TcgError::Failure),
        })
    }
}

/// Supported data removal mechanism feature (0x0404).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRemovalFeature {
    pub operation_processing: bool,
    /// Bit `n` set when mechanism `n` is supported.
    pub supported_mechanisms: u8,
    /// Bit `n` set when the time of mechanism `n` is in minutes instead of seconds.
    pub time_format: u8,
    /// Removal time per mechanism, in units of two seconds or two minutes. 0 when not reported.
    pub times: [u16; 6],
}

impl DataRemovalFeature {
    /// Returns the reported removal time of `mechanism` in seconds, `None` if the mechanism is not supported or
    /// no time is reported.
    pub fn estimated_time_seconds(&self, mechanism: DataRemovalMechanism) -> Option<u32> {
        let bit = mechanism as u8;
        let time = self.times[bit as usize] as u32;
        if self.supported_mechanisms & (1 << bit) == 0 || time == 0 {
            return None;
        }
        let unit = if self.time_format & (1 << bit) != 0 { 2 * 60 } else { 2 };
        Some(time * unit)
    }
}

/// A decoded Level 0 feature descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureDescriptor<'a> {
    TPer(TPerFeature),
    Locking(LockingFeature),
    Geometry(GeometryFeature),
    Enterprise(SscFeature),
    OpalV1(SscFeature),
    OpalV2(OpalV2Feature),
    OpalLite(PyriteFeature),
    PyriteV1(PyriteFeature),
    PyriteV2(PyriteFeature),
    BlockSid(BlockSidFeature),
    DataRemoval(DataRemovalFeature),
    /// A feature not decoded by this crate, or whose descriptor is too short for its code.
    Unknown { code: u16, data: &'a [u8] },
}

impl<'a> FeatureDescriptor<'a> {
    /// Decodes the descriptor body `data` (the bytes after the 4 byte header) of feature `code`.
    pub fn decode(code: u16, data: &'a [u8]) -> Result<Self> {
        let be = scroll::BE;
        let mut offset = 0;
        let descriptor = match code {
            FEATURE_CODE_TPER => Self::TPer(TPerFeature { flags: TPerFlags::from(data.pread::<u8>(0)?) }),
            FEATURE_CODE_LOCKING => Self::Locking(LockingFeature { flags: LockingFlags::from(data.pread::<u8>(0)?) }),
            FEATURE_CODE_GEOMETRY => Self::Geometry(GeometryFeature {
                align_required: data.pread::<u8>(0)? & 0x01 != 0,
                logical_block_size: data.pread_with(8, be)?,
                alignment_granularity: data.pread_with(12, be)?,
                lowest_aligned_lba: data.pread_with(20, be)?,
            }),
            FEATURE_CODE_ENTERPRISE | FEATURE_CODE_OPAL_SSC_V1 => {
                let ssc = SscFeature {
                    base_com_id: data.gread_with(&mut offset, be)?,
                    number_com_ids: data.gread_with(&mut offset, be)?,
                    range_crossing: data.gread::<u8>(&mut offset)? & 0x01 != 0,
                };
                if code == FEATURE_CODE_ENTERPRISE { Self::Enterprise(ssc) } else { Self::OpalV1(ssc) }
            }
            FEATURE_CODE_OPAL_SSC_V2 => Self::OpalV2(OpalV2Feature {
                base_com_id: data.gread_with(&mut offset, be)?,
                number_com_ids: data.gread_with(&mut offset, be)?,
                range_crossing: data.gread::<u8>(&mut offset)? & 0x01 != 0,
                number_locking_admin_authorities: data.gread_with(&mut offset, be)?,
                number_locking_user_authorities: data.gread_with(&mut offset, be)?,
                initial_cpin_sid_indicator: data.gread(&mut offset)?,
                cpin_sid_revert_behavior: data.gread(&mut offset)?,
            }),
            FEATURE_CODE_OPAL_SSC_LITE | FEATURE_CODE_PYRITE_SSC | FEATURE_CODE_PYRITE_SSC_V2 => {
                let pyrite = PyriteFeature {
                    base_com_id: data.pread_with(0, be)?,
                    number_com_ids: data.pread_with(2, be)?,
                    initial_cpin_sid_indicator: data.pread(9)?,
                    cpin_sid_revert_behavior: data.pread(10)?,
                };
                match code {
                    FEATURE_CODE_OPAL_SSC_LITE => Self::OpalLite(pyrite),
                    FEATURE_CODE_PYRITE_SSC => Self::PyriteV1(pyrite),
                    _ => Self::PyriteV2(pyrite),
                }
            }
            FEATURE_CODE_BLOCK_SID => Self::BlockSid(BlockSidFeature {
                state: BlockSidState::from(data.pread::<u8>(0)?),
                clear_events: BlockSidClearEvents::from(data.pread::<u8>(1)?),
            }),
            FEATURE_CODE_DATA_REMOVAL => {
                let mut times = [0_u16; 6];
                for (index, time) in times.iter_mut().enumerate() {
                    *time = data.pread_with(4 + index * 2, be)?;
                }
                Self::DataRemoval(DataRemovalFeature {
                    operation_processing: data.pread::<u8>(1)? & 0x01 != 0,
                    supported_mechanisms: data.pread(2)?,
                    time_format: data.pread(3)?,
                    times,
                })
            }
            _ => Self::Unknown { code, data },
        };
        Ok(descriptor)
    }

    /// Feature code of the descriptor.
    pub fn code(&self) -> u16 {
        match self {
            Self::TPer(_) => FEATURE_CODE_TPER,
            Self::Locking(_) => FEATURE_CODE_LOCKING,
            Self::Geometry(_) => FEATURE_CODE_GEOMETRY,
            Self::Enterprise(_) => FEATURE_CODE_ENTERPRISE,
            Self::OpalV1(_) => FEATURE_CODE_OPAL_SSC_V1,
            Self::OpalV2(_) => FEATURE_CODE_OPAL_SSC_V2,
            Self::OpalLite(_) => FEATURE_CODE_OPAL_SSC_LITE,
            Self::PyriteV1(_) => FEATURE_CODE_PYRITE_SSC,
            Self::PyriteV2(_) => FEATURE_CODE_PYRITE_SSC_V2,
            Self::BlockSid(_) => FEATURE_CODE_BLOCK_SID,
            Self::DataRemoval(_) => FEATURE_CODE_DATA_REMOVAL,
            Self::Unknown { code, .. } => *code,
        }
    }
}

/// Parsed view over a Level 0 Discovery response.
#[derive(Debug, Clone, Copy)]
pub struct Level0Discovery<'a> {
    header: Level0Header,
    /// Bytes from the start of the header to the end of the last descriptor.
    data: &'a [u8],
}

impl<'a> Level0Discovery<'a> {
    /// Validates the Level 0 header at the start of `buffer`.
    ///
    /// A length field claiming more data than `buffer` holds is clamped to the buffer.
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        let header: Level0Header = buffer.pread_with(0, scroll::BE).map_err(|_| TcgError::Failure)?;
        let claimed = (header.length as usize).saturating_add(4);
        if claimed < Level0Header::SIZE {
            log::debug!(target: "tcg_core", "Level 0 length {:#X} shorter than its header", header.length);
            return Err(TcgError::Failure);
        }
        if claimed > buffer.len() {
            log::debug!(target: "tcg_core", "Level 0 length {:#X} truncated to {:#X} byte buffer", header.length, buffer.len());
        }
        Ok(Self { header, data: &buffer[..claimed.min(buffer.len())] })
    }

    pub fn header(&self) -> &Level0Header {
        &self.header
    }

    /// Iterates the raw descriptors as `(header, body)` pairs.
    pub fn raw_descriptors(&self) -> RawDescriptors<'a> {
        RawDescriptors { data: self.data, offset: Level0Header::SIZE }
    }

    /// Iterates the decoded descriptors.
    pub fn features(&self) -> impl Iterator<Item = FeatureDescriptor<'a>> {
        self.raw_descriptors().map(|(header, body)| {
            FeatureDescriptor::decode(header.code, body).unwrap_or_else(|_| {
                log::debug!(target: "tcg_core", "Feature {:#06X} descriptor too short ({} bytes)", header.code, body.len());
                FeatureDescriptor::Unknown { code: header.code, data: body }
            })
        })
    }

    /// Returns the decoded descriptor of feature `code`.
    pub fn find(&self, code: u16) -> Option<FeatureDescriptor<'a>> {
        self.features().find(|feature| feature.code() == code)
    }

    /// Returns the complete descriptor (header included) of feature `code`.
    pub fn raw_descriptor(&self, code: u16) -> Option<&'a [u8]> {
        let data = self.data;
        let mut offset = Level0Header::SIZE;
        for (header, body) in self.raw_descriptors() {
            let size = FeatureHeader::SIZE + body.len();
            if header.code == code {
                return Some(&data[offset..offset + size]);
            }
            offset += size;
        }
        None
    }
}

/// Iterator over the raw feature descriptors of a Level 0 response. Stops at the first truncated descriptor.
#[derive(Debug, Clone)]
pub struct RawDescriptors<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for RawDescriptors<'a> {
    type Item = (FeatureHeader, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.data;
        let header: FeatureHeader = data.pread_with(self.offset, scroll::BE).ok()?;
        let start = self.offset + FeatureHeader::SIZE;
        let Some(body) = data.get(start..start + header.length as usize) else {
            log::debug!(target: "tcg_core", "Feature {:#06X} descriptor runs past the Level 0 data", header.code);
            self.offset = data.len();
            return None;
        };
        self.offset = start + body.len();
        Some((header, body))
    }
}

/// Supported security protocol list returned by security protocol 0x00, SP-specific 0x0000.
#[derive(Debug, Clone, Copy)]
pub struct SupportedProtocols<'a> {
    list: &'a [u8],
}

impl<'a> SupportedProtocols<'a> {
    const LIST_LENGTH_OFFSET: usize = 6;
    const LIST_OFFSET: usize = 8;

    /// Parses the protocol list in `buffer`. A list length beyond the buffer is clamped.
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        let length: u16 = buffer.pread_with(Self::LIST_LENGTH_OFFSET, scroll::BE).map_err(|_| TcgError::Failure)?;
        let end = (Self::LIST_OFFSET + length as usize).min(buffer.len());
        Ok(Self { list: &buffer[Self::LIST_OFFSET..end] })
    }

    pub fn contains(&self, protocol: u8) -> bool {
        self.list.contains(&protocol)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + 'a {
        let list = self.list;
        list.iter().copied()
    }
}
