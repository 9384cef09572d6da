//! scp_auto_scaling_policy - Scaling rule of an auto-scaling group
//!
//! Policies change synchronously, so no waiting is involved. ID is
//! `<asg_id>:<policy_id>`.

use async_trait::async_trait;
use scp_client::services::auto_scaling::{
    AutoScalingPolicy, COMPARISON_OPERATORS, METRIC_TYPES, POLICY_TYPES, PolicyRequest,
    SCALE_METHODS,
};
use scp_core::composite_id::CompositeId;
use scp_core::context::OperationContext;
use scp_core::marshal::Marshaller;
use scp_core::provider::{ProviderResult, ResourceHandler};
use scp_core::resource::{ResourceData, Value};
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{computed, enum_type};
use crate::meta::Meta;
use crate::utils::{call, created_id, deleted_or_gone, found_or_gone};

pub const KEY: &str = "scp_auto_scaling_policy";

pub struct AutoScalingPolicyResource;

fn policy_request(rd: &ResourceData) -> ProviderResult<PolicyRequest> {
    Ok(PolicyRequest {
        policy_name: rd.require_str("name")?.to_string(),
        policy_type: rd.require_str("policy_type")?.to_string(),
        metric_type: rd.require_str("metric_type")?.to_string(),
        comparison_operator: rd.require_str("comparison_operator")?.to_string(),
        threshold: rd.require_int("threshold")?,
        evaluation_minutes: rd.get_int("evaluation_minutes").unwrap_or(1),
        scale_method: rd.require_str("scale_method")?.to_string(),
        scale_value: rd.require_int("scale_value")?,
        cooldown_seconds: rd.get_int("cooldown_seconds").unwrap_or(300),
    })
}

impl AutoScalingPolicyResource {
    fn set_policy(
        &self,
        rd: &mut ResourceData,
        asg_id: String,
        policy: AutoScalingPolicy,
    ) -> ProviderResult<()> {
        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&["policyName"])
            .to_attributes(&policy)?;
        rd.set_attributes(attributes);
        rd.set("asg_id", asg_id);
        rd.set("name", policy.policy_name);
        Ok(())
    }
}

#[async_trait]
impl ResourceHandler<Meta> for AutoScalingPolicyResource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(KEY)
            .with_description("Metric threshold that scales an auto-scaling group")
            .attribute(
                AttributeSchema::new("asg_id", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("policy_type", enum_type(POLICY_TYPES)).required())
            .attribute(AttributeSchema::new("metric_type", enum_type(METRIC_TYPES)).required())
            .attribute(
                AttributeSchema::new("comparison_operator", enum_type(COMPARISON_OPERATORS))
                    .required(),
            )
            .attribute(AttributeSchema::new("threshold", types::non_negative_int()).required())
            .attribute(
                AttributeSchema::new("evaluation_minutes", types::positive_int())
                    .with_default(Value::Int(1)),
            )
            .attribute(AttributeSchema::new("scale_method", enum_type(SCALE_METHODS)).required())
            .attribute(AttributeSchema::new("scale_value", types::positive_int()).required())
            .attribute(
                AttributeSchema::new("cooldown_seconds", types::non_negative_int())
                    .with_default(Value::Int(300)),
            )
            .attribute(computed("policy_id", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let asg_id = rd.require_str("asg_id")?.to_string();
        let request = policy_request(rd)?;

        let policy = call(ctx, meta.client.auto_scaling.create_policy(&asg_id, &request)).await?;
        let id = created_id(&asg_id, &policy.policy_id, "auto-scaling policy")?;
        log::info!("created auto-scaling policy {} ({})", request.policy_name, id);

        rd.set_id(id.merge());
        self.set_policy(rd, asg_id, policy)
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = CompositeId::split(rd.id())?;
        let result = ctx
            .run(meta.client.auto_scaling.get_policy(&id.parent, &id.child))
            .await?;
        let Some(policy) = found_or_gone(rd, KEY, result)? else {
            return Ok(());
        };
        self.set_policy(rd, id.parent, policy)
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = CompositeId::split(rd.id())?;
        let request = policy_request(rd)?;
        let policy = call(
            ctx,
            meta.client
                .auto_scaling
                .update_policy(&id.parent, &id.child, &request),
        )
        .await?;
        self.set_policy(rd, id.parent, policy)
    }

    async fn delete(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = CompositeId::split(rd.id())?;
        let result = ctx
            .run(meta.client.auto_scaling.delete_policy(&id.parent, &id.child))
            .await?;
        if !deleted_or_gone(result)? {
            log::debug!("auto-scaling policy {} already deleted", id);
        }
        rd.set_id("");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scp_core::resource::Attributes;

    #[test]
    fn optional_fields_take_defaults() {
        let mut config = Attributes::new();
        for (k, v) in [
            ("name", "cpu-high"),
            ("policy_type", "SCALE_OUT"),
            ("metric_type", "CPU"),
            ("comparison_operator", "GE"),
            ("scale_method", "COUNT"),
        ] {
            config.insert(k.to_string(), Value::from(v));
        }
        config.insert("threshold".to_string(), Value::Int(80));
        config.insert("scale_value".to_string(), Value::Int(1));
        let mut rd = ResourceData::new(config);
        rd.apply_defaults(&AutoScalingPolicyResource.schema());

        let request = policy_request(&rd).unwrap();
        assert_eq!(request.evaluation_minutes, 1);
        assert_eq!(request.cooldown_seconds, 300);
        assert_eq!(request.threshold, 80);
    }
}
