use super::{Context, HandlerResult, reject};
use crate::cluster::ErasureProfileSpec;
use crate::request::{CreateErasureProfile, present};
use crate::validate::{CEPH_BUCKET_TYPES, is_bucket_type};

pub fn create_erasure_profile(ctx: &Context<'_>, req: &CreateErasureProfile) -> HandlerResult {
    let Some(failure_domain) = present(&req.failure_domain).filter(|d| is_bucket_type(d)) else {
        return reject(format!("failure-domain must be one of {CEPH_BUCKET_TYPES:?}"));
    };
    let Some(name) = present(&req.name) else {
        return reject("Missing parameter. name is required for the erasure profile");
    };
    ctx.cluster.create_erasure_profile(&ErasureProfileSpec {
        name,
        plugin: present(&req.erasure_type).unwrap_or("jerasure"),
        failure_domain,
        k: req.k.unwrap_or(2),
        m: req.m.unwrap_or(1),
        locality: req.l,
    })?;
    Ok(None)
}
