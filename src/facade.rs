//! The RPC façade (`spec.md` §4.6, §6): one uniform thin wrapper per named
//! RPC, generated from the method table rather than written by hand. Every
//! wrapper does the same four things — `invoke`, `await`, assert the
//! response tag matches (or is a typed-null / protocol exception), and
//! hand the decoded value (or exception) back to the caller.
//!
//! The table itself is data (`PRIMITIVE_METHODS` / `OBJECT_METHODS`); the
//! two `*_rpc!` macros below are what "generates the façade from a table,
//! not by hand" means in a language without runtime codegen.

use std::sync::Arc;

use crate::codec::{ObjectKind, ResponseTag, ResponseValue, Value};
use crate::error::RpcError;
use crate::session::Session;
use crate::slot::ResponseSlot;
use crate::wire::ProtocolDialect;

/// The decoded result of a primitive-return RPC (`spec.md` §6).
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveValue {
    Void,
    Bool(bool),
    I64(i64),
    /// A typed-null response to a call whose declared shape is primitive.
    /// `spec.md` §4.4 allows any RPC kind to be answered this way; it's an
    /// unusual but legal escape hatch, not a distinct return shape.
    Null,
}

/// The decoded result of an object-return RPC. The payload is opaque —
/// decoding it into a concrete type is the codec's and the caller's concern,
/// not the engine's (`spec.md` §3: "the engine inspects only tags").
#[derive(Clone, Debug)]
pub enum ObjectValue {
    Null,
    Object(Vec<u8>),
}

fn dialect_guard(session: &Arc<Session>, required: ProtocolDialect, method: &'static str) -> Result<(), RpcError> {
    if session.dialect() < required {
        return Err(RpcError::UnsupportedDialect(method));
    }
    Ok(())
}

fn call_primitive(
    session: &Arc<Session>,
    name: &'static str,
    args: Vec<Value>,
    expected: PrimitiveTag,
) -> Result<PrimitiveValue, RpcError> {
    let mut slot = ResponseSlot::new();
    session.invoke(name, args, &mut slot)?;
    let response = slot.await_response()?;
    match (response.tag, response.value) {
        (ResponseTag::ProtocolException, ResponseValue::Exception(e)) => Err(RpcError::Protocol(e)),
        (ResponseTag::NullTyped(_), ResponseValue::Null) => Ok(PrimitiveValue::Null),
        (ResponseTag::Void, ResponseValue::Void) if expected == PrimitiveTag::Void => Ok(PrimitiveValue::Void),
        (ResponseTag::Bool, ResponseValue::Bool(b)) if expected == PrimitiveTag::Bool => Ok(PrimitiveValue::Bool(b)),
        (ResponseTag::I64, ResponseValue::I64(v)) if expected == PrimitiveTag::I64 => Ok(PrimitiveValue::I64(v)),
        _ => Err(RpcError::UnexpectedTag),
    }
}

fn call_object(
    session: &Arc<Session>,
    name: &'static str,
    args: Vec<Value>,
    expected: ObjectKind,
) -> Result<ObjectValue, RpcError> {
    let mut slot = ResponseSlot::new();
    session.invoke(name, args, &mut slot)?;
    let response = slot.await_response()?;
    match (response.tag, response.value) {
        (ResponseTag::ProtocolException, ResponseValue::Exception(e)) => Err(RpcError::Protocol(e)),
        (ResponseTag::Object(kind), ResponseValue::Object(bytes)) if kind == expected => {
            Ok(ObjectValue::Object(bytes))
        }
        (ResponseTag::NullTyped(kind), ResponseValue::Null) if kind == expected => Ok(ObjectValue::Null),
        _ => Err(RpcError::UnexpectedTag),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PrimitiveTag {
    Void,
    Bool,
    I64,
}

macro_rules! primitive_rpc {
    ($(($fn_name:ident, $rpc_name:expr, $tag:expr, $min_dialect:expr)),* $(,)?) => {
        $(
            #[doc = concat!("Thin wrapper around the `", $rpc_name, "` RPC (primitive return).")]
            pub fn $fn_name(session: &Arc<Session>, args: Vec<Value>) -> Result<PrimitiveValue, RpcError> {
                dialect_guard(session, $min_dialect, $rpc_name)?;
                call_primitive(session, $rpc_name, args, $tag)
            }
        )*
    };
}

macro_rules! object_rpc {
    ($(($fn_name:ident, $rpc_name:expr, $kind:expr, $min_dialect:expr)),* $(,)?) => {
        $(
            #[doc = concat!("Thin wrapper around the `", $rpc_name, "` RPC (object return).")]
            pub fn $fn_name(session: &Arc<Session>, args: Vec<Value>) -> Result<ObjectValue, RpcError> {
                dialect_guard(session, $min_dialect, $rpc_name)?;
                call_object(session, $rpc_name, args, $kind)
            }
        )*
    };
}

// Primitive-return method table (`spec.md` §6). Tag assignments follow
// common NameNode RPC semantics; the spec itself only constrains these to
// "boolean, int64, void" as a group, not a method-by-method mapping.
primitive_rpc! {
    (get_protocol_version, "getProtocolVersion", PrimitiveTag::I64, ProtocolDialect::V1),
    (create, "create", PrimitiveTag::Void, ProtocolDialect::V1),
    (set_replication, "setReplication", PrimitiveTag::Bool, ProtocolDialect::V1),
    (set_permission, "setPermission", PrimitiveTag::Void, ProtocolDialect::V1),
    (set_owner, "setOwner", PrimitiveTag::Void, ProtocolDialect::V1),
    (abandon_block, "abandonBlock", PrimitiveTag::Void, ProtocolDialect::V1),
    (complete, "complete", PrimitiveTag::Bool, ProtocolDialect::V1),
    (rename, "rename", PrimitiveTag::Bool, ProtocolDialect::V1),
    (delete, "delete", PrimitiveTag::Bool, ProtocolDialect::V1),
    (mkdirs, "mkdirs", PrimitiveTag::Bool, ProtocolDialect::V1),
    (renew_lease, "renewLease", PrimitiveTag::Void, ProtocolDialect::V1),
    (get_preferred_block_size, "getPreferredBlockSize", PrimitiveTag::I64, ProtocolDialect::V1),
    (set_quota, "setQuota", PrimitiveTag::Void, ProtocolDialect::V1),
    (fsync, "fsync", PrimitiveTag::Void, ProtocolDialect::V1),
    (set_times, "setTimes", PrimitiveTag::Void, ProtocolDialect::V1),
    (recover_lease, "recoverLease", PrimitiveTag::Bool, ProtocolDialect::V1),
    (concat, "concat", PrimitiveTag::Void, ProtocolDialect::V1),
    (cancel_delegation_token, "cancelDelegationToken", PrimitiveTag::Void, ProtocolDialect::V1),
    (renew_delegation_token, "renewDelegationToken", PrimitiveTag::I64, ProtocolDialect::V1),
    (set_safe_mode, "setSafeMode", PrimitiveTag::Bool, ProtocolDialect::V1),
    (report_bad_blocks, "reportBadBlocks", PrimitiveTag::Void, ProtocolDialect::V1),
    (finalize_upgrade, "finalizeUpgrade", PrimitiveTag::Void, ProtocolDialect::V1),
    (refresh_nodes, "refreshNodes", PrimitiveTag::Void, ProtocolDialect::V1),
    (save_namespace, "saveNamespace", PrimitiveTag::Void, ProtocolDialect::V1),
    (meta_save, "metaSave", PrimitiveTag::Void, ProtocolDialect::V1),
    (set_balancer_bandwidth, "setBalancerBandwidth", PrimitiveTag::Void, ProtocolDialect::V1),
    (is_file_closed, "isFileClosed", PrimitiveTag::Bool, ProtocolDialect::V1),
    (create_symlink, "createSymlink", PrimitiveTag::Void, ProtocolDialect::V2),
}

// Object-return method table (`spec.md` §6).
object_rpc! {
    (get_block_locations, "getBlockLocations", ObjectKind::BlockLocations, ProtocolDialect::V1),
    (append, "append", ObjectKind::LocatedBlock, ProtocolDialect::V1),
    (add_block, "addBlock", ObjectKind::LocatedBlock, ProtocolDialect::V1),
    (get_listing, "getListing", ObjectKind::DirectoryListing, ProtocolDialect::V1),
    (get_stats, "getStats", ObjectKind::Stats, ProtocolDialect::V1),
    (get_file_info, "getFileInfo", ObjectKind::FileStatus, ProtocolDialect::V1),
    (get_content_summary, "getContentSummary", ObjectKind::ContentSummary, ProtocolDialect::V1),
    (get_delegation_token, "getDelegationToken", ObjectKind::DelegationToken, ProtocolDialect::V1),
    (get_datanode_report, "getDatanodeReport", ObjectKind::DatanodeReport, ProtocolDialect::V1),
    (distributed_upgrade_progress, "distributedUpgradeProgress", ObjectKind::UpgradeProgress, ProtocolDialect::V1),
    (get_server_defaults, "getServerDefaults", ObjectKind::ServerDefaults, ProtocolDialect::V2),
    (get_file_link_info, "getFileLinkInfo", ObjectKind::FileLinkInfo, ProtocolDialect::V2),
    (get_link_target, "getLinkTarget", ObjectKind::LinkTarget, ProtocolDialect::V2),
}
