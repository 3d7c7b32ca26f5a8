/// Packet types reserved by the networking layer. Application packet types
/// must stay below `BuiltInPacket::FIRST`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BuiltInPacket {
    MeasureRtt,
    RegisterPlayer,
    UnregisterPlayer,
    NotifyAddPlayer,
    NotifyRemovePlayer,
    StopNetwork,
    ReserveNetId,
    ChangeAuthor,
    SyncTransform,
    BehaviourRpc,
    DataTransporter,
}

impl BuiltInPacket {
    pub const FIRST: u8 = 200;

    pub fn to_u8(self) -> u8 {
        match self {
            BuiltInPacket::MeasureRtt => 200,
            BuiltInPacket::RegisterPlayer => 201,
            BuiltInPacket::UnregisterPlayer => 202,
            BuiltInPacket::NotifyAddPlayer => 203,
            BuiltInPacket::NotifyRemovePlayer => 204,
            BuiltInPacket::StopNetwork => 205,
            BuiltInPacket::ReserveNetId => 206,
            BuiltInPacket::ChangeAuthor => 207,
            BuiltInPacket::SyncTransform => 208,
            BuiltInPacket::BehaviourRpc => 209,
            BuiltInPacket::DataTransporter => 210,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            200 => Some(BuiltInPacket::MeasureRtt),
            201 => Some(BuiltInPacket::RegisterPlayer),
            202 => Some(BuiltInPacket::UnregisterPlayer),
            203 => Some(BuiltInPacket::NotifyAddPlayer),
            204 => Some(BuiltInPacket::NotifyRemovePlayer),
            205 => Some(BuiltInPacket::StopNetwork),
            206 => Some(BuiltInPacket::ReserveNetId),
            207 => Some(BuiltInPacket::ChangeAuthor),
            208 => Some(BuiltInPacket::SyncTransform),
            209 => Some(BuiltInPacket::BehaviourRpc),
            210 => Some(BuiltInPacket::DataTransporter),
            _ => None,
        }
    }
}
