//! Integration tests for the SCP client using wiremock
//!
//! These tests verify request signing, path and query construction, and the
//! status handling of the client against mocked endpoints.

use scp_client::http::{
    HEADER_ACCESS_KEY, HEADER_CLIENT_TYPE, HEADER_PROJECT_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP,
};
use scp_client::services::routing::{CreateRoutingRuleRequest, RoutingScope};
use scp_client::services::tag::Tag;
use scp_client::services::vpc::{CreateVpcRequest, VpcListQuery};
use scp_client::{ClientConfig, ClientError, PageRequest, ScpClient, is_deleted};
use scp_core::waiter::StatusError;
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ScpClient {
    let config =
        ClientConfig::new("test-access", "test-secret", "PROJECT-1").with_endpoint(server.uri());
    ScpClient::new(config).expect("client should build")
}

#[tokio::test]
async fn test_requests_are_signed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vpc/v2/vpcs/VPC-1"))
        .and(header(HEADER_ACCESS_KEY, "test-access"))
        .and(header(HEADER_PROJECT_ID, "PROJECT-1"))
        .and(header(HEADER_CLIENT_TYPE, "OpenApi"))
        .and(header_exists(HEADER_TIMESTAMP))
        .and(header_exists(HEADER_SIGNATURE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vpcId": "VPC-1",
            "vpcName": "netA",
            "vpcState": "ACTIVE",
            "createdDt": "2024-03-01T12:30:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vpc = client(&server).vpc.get("VPC-1").await.unwrap();
    assert_eq!(vpc.vpc_name, "netA");
    assert_eq!(vpc.vpc_state, "ACTIVE");
    assert!(vpc.created_dt.is_some());
}

#[tokio::test]
async fn test_list_sends_filters_and_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vpc/v2/vpcs"))
        .and(query_param("vpcName", "netA"))
        .and(query_param("page", "0"))
        .and(query_param("size", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contents": [
                {"vpcId": "VPC-1", "vpcName": "netA", "vpcState": "ACTIVE"},
                {"vpcId": "VPC-2", "vpcName": "netA", "vpcState": "CREATING"}
            ],
            "totalCount": 2
        })))
        .mount(&server)
        .await;

    let query = VpcListQuery {
        vpc_name: Some("netA".to_string()),
        ..Default::default()
    };
    let list = client(&server)
        .vpc
        .list(&query, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(list.total_count, 2);
    assert_eq!(list.contents[1].vpc_id, "VPC-2");
}

#[tokio::test]
async fn test_create_posts_camel_case_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/vpc/v3/vpcs"))
        .and(body_json(json!({
            "vpcName": "netA",
            "vpcDescription": "d",
            "serviceZoneId": "ZONE-1",
            "tags": [{"tagKey": "env", "tagValue": "dev"}]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"resourceId": "VPC-9", "requestId": "REQ-1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = CreateVpcRequest {
        vpc_name: "netA".to_string(),
        vpc_description: "d".to_string(),
        service_zone_id: "ZONE-1".to_string(),
        tags: vec![Tag::new("env", "dev")],
    };
    let response = client(&server).vpc.create(&request).await.unwrap();
    assert_eq!(response.resource_id, "VPC-9");
}

#[tokio::test]
async fn test_404_keeps_status_and_means_deleted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/subnet/v2/subnets/SUBNET-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "NOT_FOUND",
            "message": "Subnet does not exist"
        })))
        .mount(&server)
        .await;

    let err = client(&server).subnet.get("SUBNET-1").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(is_deleted(&err));
    match err {
        ClientError::Api { code, message, .. } => {
            assert_eq!(code.as_deref(), Some("NOT_FOUND"));
            assert_eq!(message, "Subnet does not exist");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_403_means_deleted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/load-balancer/v2/load-balancers/LB-1"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client(&server).load_balancer.get("LB-1").await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert!(is_deleted(&err));
}

#[tokio::test]
async fn test_5xx_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dns/v2/dns-domains/DNS-1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client(&server).dns.get_domain("DNS-1").await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.is_transient());
    assert!(!is_deleted(&err));
}

#[tokio::test]
async fn test_duplication_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/subnet/v2/subnets/subnet-cidr-range-duplication"))
        .and(query_param("vpcId", "VPC-1"))
        .and(query_param("subnetCidrBlock", "10.0.0.0/24"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
        .mount(&server)
        .await;

    let duplicated = client(&server)
        .subnet
        .is_cidr_duplicated("VPC-1", "10.0.0.0/24")
        .await
        .unwrap();
    assert!(duplicated);
}

#[tokio::test]
async fn test_routing_rule_lookup_and_bulk_delete() {
    let server = MockServer::start().await;
    let rules_path = "/transit-gateway/v2/routing-tables/RTB-1/routing-rules";

    Mock::given(method("POST"))
        .and(path(rules_path))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"resourceId": "RULE-1"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(rules_path))
        .and(query_param("routingRuleId", "RULE-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contents": [{
                "routingRuleId": "RULE-1",
                "routingTableId": "RTB-1",
                "destinationNetworkCidr": "192.168.0.0/16",
                "routingRuleState": "ACTIVE"
            }],
            "totalCount": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(rules_path))
        .and(query_param("routingRuleId", "RULE-2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"contents": [], "totalCount": 0})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(rules_path))
        .and(body_json(json!({"routingRuleIds": ["RULE-1"]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let request = CreateRoutingRuleRequest {
        destination_network_cidr: "192.168.0.0/16".to_string(),
        source_service_interface_id: "TGW-1".to_string(),
        source_service_interface_name: "tgw".to_string(),
        ..Default::default()
    };
    let created = client
        .routing
        .create_rule(RoutingScope::TransitGateway, "RTB-1", &request)
        .await
        .unwrap();
    assert_eq!(created.resource_id, "RULE-1");

    let rule = client
        .routing
        .get_rule(RoutingScope::TransitGateway, "RTB-1", "RULE-1")
        .await
        .unwrap();
    assert_eq!(rule.destination_network_cidr, "192.168.0.0/16");

    let missing = client
        .routing
        .get_rule(RoutingScope::TransitGateway, "RTB-1", "RULE-2")
        .await
        .unwrap_err();
    assert!(is_deleted(&missing));

    let deleted = client
        .routing
        .delete_rules(RoutingScope::TransitGateway, "RTB-1", &["RULE-1".to_string()])
        .await
        .unwrap();
    assert!(deleted.is_none());
}

#[tokio::test]
async fn test_tag_add_and_remove() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tag/v2/resources/VPC-1/tags"))
        .and(body_json(json!({"tags": [{"tagKey": "env", "tagValue": "prod"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/tag/v2/resources/VPC-1/tags"))
        .and(body_json(json!({"tagKeys": ["owner"]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .tag
        .add_tags("VPC-1", &[Tag::new("env", "prod")])
        .await
        .unwrap();
    client
        .tag
        .remove_tags("VPC-1", &["owner".to_string()])
        .await
        .unwrap();
}
