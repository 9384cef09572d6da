//! End-to-end handler lifecycles against a mocked control plane
//!
//! Each test drives a registered descriptor the way the host engine would
//! and checks both the resulting attributes and the REST calls issued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use scp_client::{ClientConfig, ScpClient};
use scp_core::context::OperationContext;
use scp_core::provider::{ErrorKind, ProviderDescriptor};
use scp_core::resource::{Attributes, ResourceData, Value};
use scp_core::waiter::WaitConfig;
use scp_provider::Meta;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Answers with each template in turn, repeating the last one
struct Sequence {
    responses: Vec<ResponseTemplate>,
    next: AtomicUsize,
}

impl Sequence {
    fn new(responses: Vec<ResponseTemplate>) -> Self {
        Self {
            responses,
            next: AtomicUsize::new(0),
        }
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        self.responses[i.min(self.responses.len() - 1)].clone()
    }
}

fn ok(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({"message": "resource does not exist"}))
}

fn meta(server: &MockServer) -> Meta {
    let config = ClientConfig::new("test-access", "test-secret", "PROJECT-1")
        .with_endpoint(server.uri());
    let client = ScpClient::new(config).expect("client should build");
    Meta::new(client)
        .with_wait(WaitConfig::fast())
        .with_region("R1")
}

fn provider() -> ProviderDescriptor<Meta> {
    scp_provider::provider().expect("provider should assemble")
}

fn attrs(pairs: Vec<(&str, Value)>) -> Attributes {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect::<HashMap<_, _>>()
}

async fn mount_service_zones(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/project/v2/service-zones"))
        .respond_with(ok(json!({
            "contents": [{
                "serviceZoneId": "ZONE-1",
                "serviceZoneName": "R1 zone",
                "serviceZoneLocation": "R1",
                "isMultiAvailabilityZone": false
            }],
            "totalCount": 1
        })))
        .mount(server)
        .await;
}

async fn mount_empty_tags(server: &MockServer, resource_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/tag/v2/resources/{}/tags", resource_id)))
        .respond_with(ok(json!({"contents": [], "totalCount": 0})))
        .mount(server)
        .await;
}

fn vpc_body(state: &str) -> ResponseTemplate {
    ok(json!({
        "vpcId": "VPC-1",
        "vpcName": "netA",
        "vpcDescription": "d",
        "vpcState": state,
        "serviceZoneId": "ZONE-1",
        "createdDt": "2024-03-01T12:30:00Z"
    }))
}

#[tokio::test]
async fn test_vpc_create_read_delete() {
    let server = MockServer::start().await;
    let provider = provider();
    let vpc = provider.resource("scp_vpc").unwrap();
    let meta = meta(&server);
    let ctx = OperationContext::background();

    mount_service_zones(&server).await;
    mount_empty_tags(&server, "VPC-1").await;
    Mock::given(method("GET"))
        .and(path("/vpc/v2/vpcs/vpc-name-duplication"))
        .and(query_param("vpcName", "netA"))
        .respond_with(ok(json!({"result": false})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/vpc/v3/vpcs"))
        .and(body_json(json!({
            "vpcName": "netA",
            "vpcDescription": "d",
            "serviceZoneId": "ZONE-1",
            "tags": []
        })))
        .respond_with(ok(json!({"resourceId": "VPC-1", "requestId": "REQ-1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vpc/v2/vpcs/VPC-1"))
        .respond_with(Sequence::new(vec![
            vpc_body("CREATING"),
            vpc_body("ACTIVE"),
        ]))
        .mount(&server)
        .await;

    let mut rd = ResourceData::new(attrs(vec![
        ("name", Value::from("netA")),
        ("description", Value::from("d")),
        ("region", Value::from("R1")),
    ]));
    vpc.create(&ctx, &mut rd, &meta).await.unwrap();

    assert_eq!(rd.id(), "VPC-1");
    assert_eq!(rd.get_str("name"), Some("netA"));
    assert_eq!(rd.get_str("description"), Some("d"));
    assert_eq!(rd.get_str("region"), Some("R1"));
    assert_eq!(rd.get_str("vpc_state"), Some("ACTIVE"));

    server.reset().await;
    Mock::given(method("DELETE"))
        .and(path("/vpc/v2/vpcs/VPC-1"))
        .respond_with(ok(json!({"resourceId": "VPC-1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vpc/v2/vpcs/VPC-1"))
        .respond_with(Sequence::new(vec![vpc_body("DELETING"), not_found()]))
        .mount(&server)
        .await;

    vpc.delete(&ctx, &mut rd, &meta).await.unwrap();
    assert_eq!(rd.id(), "");
}

#[tokio::test]
async fn test_delete_of_missing_object_succeeds() {
    let server = MockServer::start().await;
    let provider = provider();
    let vpc = provider.resource("scp_vpc").unwrap();

    Mock::given(method("DELETE"))
        .and(path("/vpc/v2/vpcs/VPC-1"))
        .respond_with(not_found())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vpc/v2/vpcs/VPC-1"))
        .respond_with(not_found())
        .expect(0)
        .mount(&server)
        .await;

    let mut rd = ResourceData::from_state("VPC-1", Attributes::new());
    vpc.delete(&OperationContext::background(), &mut rd, &meta(&server))
        .await
        .unwrap();
    assert_eq!(rd.id(), "");
}

#[tokio::test]
async fn test_read_of_missing_object_clears_id() {
    let server = MockServer::start().await;
    let provider = provider();
    let vpc = provider.resource("scp_vpc").unwrap();

    Mock::given(method("GET"))
        .and(path("/vpc/v2/vpcs/VPC-1"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let mut rd = ResourceData::from_state("VPC-1", Attributes::new());
    vpc.read(&OperationContext::background(), &mut rd, &meta(&server))
        .await
        .unwrap();
    assert_eq!(rd.id(), "");
}

#[tokio::test]
async fn test_subnet_cidr_overlap_is_rejected_before_create() {
    let server = MockServer::start().await;
    let provider = provider();
    let subnet = provider.resource("scp_subnet").unwrap();

    Mock::given(method("GET"))
        .and(path("/subnet/v2/subnets/subnet-cidr-range-duplication"))
        .and(query_param("vpcId", "VPC-1"))
        .and(query_param("subnetCidrBlock", "10.0.0.0/24"))
        .respond_with(ok(json!({"result": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/subnet/v2/subnets"))
        .respond_with(ok(json!({"resourceId": "SUBNET-1"})))
        .expect(0)
        .mount(&server)
        .await;

    let mut rd = ResourceData::new(attrs(vec![
        ("vpc_id", Value::from("VPC-1")),
        ("name", Value::from("subA")),
        ("type", Value::from("PRIVATE")),
        ("cidr_block", Value::from("10.0.0.0/24")),
    ]));
    let err = subnet
        .create(&OperationContext::background(), &mut rd, &meta(&server))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(err.message.contains("10.0.0.0/24"), "{}", err);
    assert_eq!(err.resource.as_deref(), Some("scp_subnet"));
    assert_eq!(rd.id(), "");
}

#[tokio::test]
async fn test_auto_scaling_group_counts_are_checked_before_any_call() {
    let server = MockServer::start().await;
    let provider = provider();
    let asg = provider.resource("scp_auto_scaling_group").unwrap();

    let mut rd = ResourceData::new(attrs(vec![
        ("name", Value::from("asgA")),
        ("image_id", Value::from("IMAGE-1")),
        ("server_type", Value::from("s1v2m4")),
        ("vpc_id", Value::from("VPC-1")),
        ("subnet_ids", Value::List(vec![Value::from("SUBNET-1")])),
        ("min_server_count", Value::Int(5)),
        ("desired_server_count", Value::Int(3)),
        ("max_server_count", Value::Int(10)),
    ]));
    let err = asg
        .create(&OperationContext::background(), &mut rd, &meta(&server))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.attribute.as_deref(), Some("min_server_count"));
    assert!(
        err.message
            .contains("min_server_count (5) must not be greater than desired_server_count (3)"),
        "{}",
        err
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

fn rules_body(state: Option<&str>) -> ResponseTemplate {
    let contents = match state {
        Some(state) => json!([{
            "routingRuleId": "RULE-1",
            "routingTableId": "RT-1",
            "destinationNetworkCidr": "192.168.0.0/16",
            "sourceServiceInterfaceId": "TGW-1",
            "sourceServiceInterfaceName": "tgw",
            "routingRuleState": state,
            "ruleDescription": "",
            "editable": true
        }]),
        None => json!([]),
    };
    ok(json!({"contents": contents}))
}

#[tokio::test]
async fn test_transit_gateway_routing_rule_lifecycle() {
    let server = MockServer::start().await;
    let provider = provider();
    let rule = provider
        .resource("scp_transit_gateway_routing_rule")
        .unwrap();
    let meta = meta(&server);
    let ctx = OperationContext::background();
    let rules_path = "/transit-gateway/v2/routing-tables/RT-1/routing-rules";

    Mock::given(method("POST"))
        .and(path(rules_path))
        .and(body_json(json!({
            "destinationNetworkCidr": "192.168.0.0/16",
            "sourceServiceInterfaceId": "TGW-1",
            "sourceServiceInterfaceName": "tgw"
        })))
        .respond_with(ok(json!({"resourceId": "RULE-1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(rules_path))
        .and(query_param("routingRuleId", "RULE-1"))
        .respond_with(Sequence::new(vec![
            rules_body(Some("CREATING")),
            rules_body(Some("ACTIVE")),
        ]))
        .mount(&server)
        .await;

    let mut rd = ResourceData::new(attrs(vec![
        ("routing_table_id", Value::from("RT-1")),
        ("destination_network_cidr", Value::from("192.168.0.0/16")),
        ("source_service_interface_id", Value::from("TGW-1")),
        ("source_service_interface_name", Value::from("tgw")),
    ]));
    rule.create(&ctx, &mut rd, &meta).await.unwrap();
    assert_eq!(rd.id(), "RT-1:RULE-1");
    assert_eq!(rd.get_str("routing_rule_state"), Some("ACTIVE"));

    let mut reread = ResourceData::from_state("RT-1:RULE-1", Attributes::new());
    rule.read(&ctx, &mut reread, &meta).await.unwrap();
    assert_eq!(reread.get_str("routing_table_id"), Some("RT-1"));
    assert_eq!(reread.get_str("destination_network_cidr"), Some("192.168.0.0/16"));

    server.reset().await;
    Mock::given(method("DELETE"))
        .and(path(rules_path))
        .and(body_json(json!({"routingRuleIds": ["RULE-1"]})))
        .respond_with(Sequence::new(vec![
            ok(json!({"resourceId": "RULE-1"})),
            not_found(),
        ]))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(rules_path))
        .respond_with(Sequence::new(vec![
            rules_body(Some("DELETING")),
            rules_body(None),
        ]))
        .mount(&server)
        .await;

    rule.delete(&ctx, &mut rd, &meta).await.unwrap();
    assert_eq!(rd.id(), "");

    let mut again = ResourceData::from_state("RT-1:RULE-1", Attributes::new());
    rule.delete(&ctx, &mut again, &meta).await.unwrap();
    assert_eq!(again.id(), "");
}

#[tokio::test]
async fn test_routing_rule_create_without_returned_id_is_an_api_error() {
    let server = MockServer::start().await;
    let provider = provider();
    let rule = provider.resource("scp_vpc_routing_rule").unwrap();

    Mock::given(method("POST"))
        .and(path("/vpc/v2/routing-tables/RT-1/routing-rules"))
        .respond_with(ok(json!({"resourceId": ""})))
        .expect(1)
        .mount(&server)
        .await;

    let mut rd = ResourceData::new(attrs(vec![
        ("routing_table_id", Value::from("RT-1")),
        ("destination_network_cidr", Value::from("10.1.0.0/16")),
        ("source_service_interface_id", Value::from("IGW-1")),
    ]));
    let err = rule
        .create(&OperationContext::background(), &mut rd, &meta(&server))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Api);
    assert!(err.message.contains("may have been created"), "{}", err);
    assert_eq!(rd.id(), "");
}

fn domain_body(state: &str) -> ResponseTemplate {
    ok(json!({
        "dnsDomainId": "DNS-1",
        "dnsDomainName": "internal.example",
        "dnsRootDomainName": "example",
        "dnsDomainState": state,
        "dnsDescription": ""
    }))
}

async fn mount_domain_create(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/dns/v2/dns-domains/name-duplication"))
        .respond_with(ok(json!({"result": false})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dns/v2/dns-domains"))
        .respond_with(ok(json!({"resourceId": "DNS-1"})))
        .expect(1)
        .mount(server)
        .await;
}

fn domain_config() -> ResourceData {
    ResourceData::new(attrs(vec![
        ("name", Value::from("internal.example")),
        ("root_domain_name", Value::from("example")),
    ]))
}

#[tokio::test]
async fn test_dns_domain_create_tolerates_startup_not_found() {
    let server = MockServer::start().await;
    let provider = provider();
    let domain = provider.resource("scp_dns_domain").unwrap();

    mount_domain_create(&server).await;
    mount_empty_tags(&server, "DNS-1").await;
    let mut answers: Vec<ResponseTemplate> = (0..5).map(|_| not_found()).collect();
    answers.push(domain_body("CREATING"));
    answers.push(domain_body("ACTIVE"));
    Mock::given(method("GET"))
        .and(path("/dns/v2/dns-domains/DNS-1"))
        .respond_with(Sequence::new(answers))
        .mount(&server)
        .await;

    let mut rd = domain_config();
    domain
        .create(&OperationContext::background(), &mut rd, &meta(&server))
        .await
        .unwrap();
    assert_eq!(rd.id(), "DNS-1");
    assert_eq!(rd.get_str("dns_domain_state"), Some("ACTIVE"));
}

#[tokio::test]
async fn test_dns_domain_create_gives_up_after_repeated_not_found() {
    let server = MockServer::start().await;
    let provider = provider();
    let domain = provider.resource("scp_dns_domain").unwrap();

    mount_domain_create(&server).await;
    Mock::given(method("GET"))
        .and(path("/dns/v2/dns-domains/DNS-1"))
        .respond_with(not_found())
        .expect(6)
        .mount(&server)
        .await;

    let mut rd = domain_config();
    let err = domain
        .create(&OperationContext::background(), &mut rd, &meta(&server))
        .await
        .unwrap_err();
    assert!(err.is_gone(), "{}", err);
    assert_eq!(rd.id(), "");
}

fn cluster_body(servers: [(&str, &str); 2]) -> ResponseTemplate {
    ok(json!({
        "databaseClusterId": "PG-1",
        "databaseClusterName": "pgA",
        "databaseClusterState": "RUNNING",
        "serviceZoneId": "ZONE-1",
        "servers": [
            {"serverId": "S-1", "serverRole": "ACTIVE", "serverState": servers[0].0, "serverType": servers[0].1},
            {"serverId": "S-2", "serverRole": "STANDBY", "serverState": servers[1].0, "serverType": servers[1].1}
        ]
    }))
}

fn cluster_config(cpu: i64, memory: i64) -> Attributes {
    attrs(vec![
        ("name", Value::from("pgA")),
        ("database_name", Value::from("app")),
        ("database_user_name", Value::from("admin")),
        ("database_user_password", Value::from("secret-pw")),
        ("image_id", Value::from("IMAGE-PG")),
        ("subnet_id", Value::from("SUBNET-1")),
        ("block_storage_size_gb", Value::Int(100)),
        ("cpu_count", Value::Int(cpu)),
        ("memory_size_gb", Value::Int(memory)),
    ])
}

#[tokio::test]
async fn test_postgresql_scale_up_walks_every_server() {
    let server = MockServer::start().await;
    let provider = provider();
    let cluster = provider.resource("scp_postgresql_cluster").unwrap();

    mount_service_zones(&server).await;
    mount_empty_tags(&server, "PG-1").await;
    Mock::given(method("GET"))
        .and(path("/product/v2/scale-products"))
        .and(query_param("productGroup", "POSTGRESQL"))
        .respond_with(ok(json!({
            "contents": [
                {"serverType": "db2v4", "cpuCount": 2, "memorySizeGb": 4},
                {"serverType": "db4v8", "cpuCount": 4, "memorySizeGb": 8}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/postgresql/v2/clusters/PG-1"))
        .respond_with(Sequence::new(vec![
            cluster_body([("RUNNING", "db2v4"), ("RUNNING", "db2v4")]),
            // S-1 has not picked up the request yet
            cluster_body([("RUNNING", "db2v4"), ("RUNNING", "db2v4")]),
            cluster_body([("Scale Up", "db2v4"), ("RUNNING", "db2v4")]),
            cluster_body([("In Service", "db4v8"), ("RUNNING", "db2v4")]),
            cluster_body([("In Service", "db4v8"), ("Scale Up", "db2v4")]),
            cluster_body([("In Service", "db4v8"), ("In Service", "db4v8")]),
        ]))
        .mount(&server)
        .await;
    for server_id in ["S-1", "S-2"] {
        Mock::given(method("PUT"))
            .and(path(format!(
                "/postgresql/v2/clusters/PG-1/servers/{}/server-type",
                server_id
            )))
            .and(body_json(json!({"serverType": "db4v8"})))
            .respond_with(ok(json!({"resourceId": "PG-1"})))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/tag/v2/resources/PG-1/tags"))
        .respond_with(ok(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let mut rd = ResourceData::for_update("PG-1", cluster_config(2, 4), cluster_config(4, 8));
    cluster
        .update(&OperationContext::background(), &mut rd, &meta(&server))
        .await
        .unwrap();

    assert_eq!(rd.id(), "PG-1");
    assert_eq!(rd.get_str("region"), Some("R1"));
    let servers = rd.get_list("servers");
    assert_eq!(servers.len(), 2);
    for entry in servers {
        let map = entry.as_map().unwrap();
        assert_eq!(map["server_state"], Value::from("In Service"));
        assert_eq!(map["server_type"], Value::from("db4v8"));
    }
}

#[tokio::test]
async fn test_vpc_list_data_source_filters_rows() {
    let server = MockServer::start().await;
    let provider = provider();
    let vpcs = provider.data_source("scp_vpcs").unwrap();

    Mock::given(method("GET"))
        .and(path("/vpc/v2/vpcs"))
        .and(query_param("page", "0"))
        .and(query_param("size", "20"))
        .respond_with(ok(json!({
            "contents": [
                {"vpcId": "VPC-1", "vpcName": "netA", "vpcState": "ACTIVE"},
                {"vpcId": "VPC-2", "vpcName": "netB", "vpcState": "CREATING"}
            ],
            "totalCount": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filter = Value::Map(attrs(vec![
        ("name", Value::from("vpc_state")),
        ("values", Value::List(vec![Value::from("^ACT.*")])),
        ("use_regex", Value::Bool(true)),
    ]));
    let mut rd = ResourceData::new(attrs(vec![("filter", Value::List(vec![filter]))]));
    vpcs.read(&OperationContext::background(), &mut rd, &meta(&server))
        .await
        .unwrap();

    assert!(!rd.id().is_empty());
    assert_eq!(rd.get_int("total_count"), Some(1));
    let rows = rd.get_list("contents");
    assert_eq!(rows.len(), 1);
    let id = rows[0].as_map().and_then(|m| m.get("vpc_id"));
    assert_eq!(id.and_then(Value::as_str), Some("VPC-1"));
}

#[tokio::test]
async fn test_region_data_source_defaults_to_provider_region() {
    let server = MockServer::start().await;
    let provider = provider();
    let region = provider.data_source("scp_region").unwrap();
    mount_service_zones(&server).await;

    let mut rd = ResourceData::new(Attributes::new());
    region
        .read(&OperationContext::background(), &mut rd, &meta(&server))
        .await
        .unwrap();
    assert_eq!(rd.id(), "ZONE-1");
    assert_eq!(rd.get_str("name"), Some("R1"));
    assert_eq!(rd.get_str("location"), Some("R1"));
    assert_eq!(rd.get_bool("is_multi_availability_zone"), Some(false));
}
