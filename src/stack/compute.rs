use serde_json::json;

use super::boot_script;
use super::{
    ASSET_BUCKET, EC2_ROLE, EC2_SECURITY_GROUP, INSTANCE, INSTANCE_PROFILE, PUBLIC_SUBNET1,
    SSH_SECURITY_GROUP,
};
use crate::catalog::Slot;
use crate::config::types::Environment;
use crate::resource::reference::reference;
use crate::resource::{name_tag, LogicalResource, ResourceKind};

/// Asset bucket and the compute instance.
///
/// The instance never enforces its boot script or image after creation.
pub fn resources(env: &Environment, ami: &str) -> Vec<LogicalResource> {
    let stack = env.stack_name();
    let bucket_ref = format!("${{{}.id}}", ASSET_BUCKET);
    let user_data = boot_script::render(stack, &bucket_ref, env.ssh_pub_key.as_deref());

    vec![
        LogicalResource::new(ASSET_BUCKET, ResourceKind::Bucket)
            .bound_through(Slot::AssetBucket)
            .attr("force_destroy", true)
            .name_tag(name_tag(stack, "EC2/assetBucket")),
        LogicalResource::new(INSTANCE, ResourceKind::Instance)
            .bound_through(Slot::Ec2Instance)
            .attr("instance_type", env.instance_type())
            .attr("ami", ami)
            .attr("subnet_id", reference(PUBLIC_SUBNET1, "id"))
            .attr(
                "vpc_security_group_ids",
                json!([
                    reference(EC2_SECURITY_GROUP, "id"),
                    reference(SSH_SECURITY_GROUP, "id"),
                ]),
            )
            .attr("iam_instance_profile", reference(INSTANCE_PROFILE, "name"))
            .attr("user_data", user_data)
            .name_tag(name_tag(stack, "EC2/Instance"))
            .ignore("user_data")
            .ignore("ami")
            .depends_on(PUBLIC_SUBNET1)
            .depends_on(EC2_SECURITY_GROUP)
            .depends_on(SSH_SECURITY_GROUP)
            .depends_on(INSTANCE_PROFILE)
            .depends_on(EC2_ROLE)
            .depends_on(ASSET_BUCKET),
    ]
}
