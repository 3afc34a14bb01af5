//! Calico API client
//!
//! Implements the Calico REST API client for BGP peers and IP pools.
//! Based on the projectcalico.org/v3 API structure served by the Calico API
//! server: /apis/projectcalico.org/v3/bgppeers/ and /apis/projectcalico.org/v3/ippools/

use crate::calico_trait::CalicoClientTrait;
use crate::common::{require_name, resource_name, HttpClient};
use crate::error::CalicoError;
use crds::{BGPPeer, IPPool, CALICO_API_GROUP, CALICO_API_VERSION};
use kube::Resource;
use reqwest::{Certificate, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Transport options for [`CalicoClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout
    pub timeout: Duration,
    /// PEM bundle trusted in addition to the webpki roots
    pub ca_cert_pem: Option<Vec<u8>>,
    /// Skip TLS verification (test clusters only)
    pub insecure_skip_tls_verify: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            ca_cert_pem: None,
            insecure_skip_tls_verify: false,
        }
    }
}

/// Calico API client
#[derive(Debug)]
pub struct CalicoClient {
    http: HttpClient,
}

impl CalicoClient {
    /// Create a new Calico client
    ///
    /// # Arguments
    /// * `base_url` - API server URL (e.g., "https://kubernetes.default.svc")
    /// * `token` - Optional bearer token
    /// * `options` - Timeout and TLS settings
    pub fn new(
        base_url: String,
        token: Option<String>,
        options: ClientOptions,
    ) -> Result<Self, CalicoError> {
        let mut builder = Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.insecure_skip_tls_verify);

        if let Some(pem) = &options.ca_cert_pem {
            for cert in Certificate::from_pem_bundle(pem)? {
                builder = builder.add_root_certificate(cert);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            http: HttpClient::new(client, base_url, token),
        })
    }

    async fn get_object<K>(&self, name: &str) -> Result<K, CalicoError>
    where
        K: Resource<DynamicType = ()> + DeserializeOwned,
    {
        require_name(&K::kind(&()), name)?;
        let path = HttpClient::object_path(&K::url_path(&(), None), name);
        debug!("Fetching {} {} from Calico", K::kind(&()), name);

        self.http
            .get(&path)
            .await
            .map_err(|e| e.for_existing(&K::kind(&()), name))
    }

    async fn create_object<K>(&self, object: &K) -> Result<K, CalicoError>
    where
        K: Resource<DynamicType = ()> + Serialize + DeserializeOwned,
    {
        let name = resource_name(object)?;
        debug!("Creating {} {} in Calico", K::kind(&()), name);

        self.http
            .post(&K::url_path(&(), None), object)
            .await
            .map_err(|e| e.for_resource(&K::kind(&()), &name))
    }

    /// Full-object replace.
    ///
    /// The API server rejects a replace without `metadata.resourceVersion`,
    /// so when the caller did not carry one the live object's version is used.
    async fn replace_object<K>(&self, object: &K) -> Result<K, CalicoError>
    where
        K: Resource<DynamicType = ()> + Serialize + DeserializeOwned + Clone,
    {
        let name = resource_name(object)?;
        let mut object = object.clone();

        if object.meta().resource_version.is_none() {
            let live: K = self.get_object(&name).await?;
            object.meta_mut().resource_version = live.meta().resource_version.clone();
        }

        debug!("Replacing {} {} in Calico", K::kind(&()), name);
        let path = HttpClient::object_path(&K::url_path(&(), None), &name);

        self.http
            .put(&path, &object)
            .await
            .map_err(|e| e.for_existing(&K::kind(&()), &name))
    }

    async fn delete_object<K>(&self, name: &str) -> Result<(), CalicoError>
    where
        K: Resource<DynamicType = ()>,
    {
        require_name(&K::kind(&()), name)?;
        let path = HttpClient::object_path(&K::url_path(&(), None), name);
        debug!("Deleting {} {} from Calico", K::kind(&()), name);

        self.http
            .delete(&path)
            .await
            .map_err(|e| e.for_existing(&K::kind(&()), name))
    }
}

#[async_trait::async_trait]
impl CalicoClientTrait for CalicoClient {
    fn base_url(&self) -> &str {
        self.http.base_url()
    }

    async fn validate_token(&self) -> Result<(), CalicoError> {
        let path = format!("/apis/{}/{}", CALICO_API_GROUP, CALICO_API_VERSION);
        debug!("Validating Calico token and connectivity");

        let _: serde_json::Value = self.http.get(&path).await?;

        debug!("Token validated successfully");
        Ok(())
    }

    async fn get_bgp_peer(&self, name: &str) -> Result<BGPPeer, CalicoError> {
        self.get_object(name).await
    }

    async fn create_bgp_peer(&self, peer: &BGPPeer) -> Result<BGPPeer, CalicoError> {
        self.create_object(peer).await
    }

    async fn update_bgp_peer(&self, peer: &BGPPeer) -> Result<BGPPeer, CalicoError> {
        self.replace_object(peer).await
    }

    async fn delete_bgp_peer(&self, name: &str) -> Result<(), CalicoError> {
        self.delete_object::<BGPPeer>(name).await
    }

    async fn get_ip_pool(&self, name: &str) -> Result<IPPool, CalicoError> {
        self.get_object(name).await
    }

    async fn create_ip_pool(&self, pool: &IPPool) -> Result<IPPool, CalicoError> {
        self.create_object(pool).await
    }

    async fn update_ip_pool(&self, pool: &IPPool) -> Result<IPPool, CalicoError> {
        self.replace_object(pool).await
    }

    async fn delete_ip_pool(&self, name: &str) -> Result<(), CalicoError> {
        self.delete_object::<IPPool>(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers one request with an empty 200 and returns its request line.
    /// Yields `None` if nothing connects within half a second.
    async fn one_shot_server() -> (String, JoinHandle<Option<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let accepted = tokio::time::timeout(Duration::from_millis(500), listener.accept()).await;
            let Ok(Ok((mut socket, _))) = accepted else {
                return None;
            };
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let request_line = String::from_utf8_lossy(&buf[..n])
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
            Some(request_line)
        });

        (url, handle)
    }

    #[tokio::test]
    async fn test_delete_targets_named_object() {
        let (url, server) = one_shot_server().await;
        let client = CalicoClient::new(url, None, ClientOptions::default()).unwrap();

        client.delete_ip_pool("pool-a").await.unwrap();

        assert_eq!(
            server.await.unwrap().as_deref(),
            Some("DELETE /apis/projectcalico.org/v3/ippools/pool-a HTTP/1.1")
        );
    }

    #[tokio::test]
    async fn test_empty_name_never_reaches_the_collection() {
        let (url, server) = one_shot_server().await;
        let client = CalicoClient::new(url, None, ClientOptions::default()).unwrap();

        assert!(matches!(
            client.delete_ip_pool("").await,
            Err(CalicoError::InvalidRequest(_))
        ));
        assert!(matches!(
            client.get_bgp_peer("").await,
            Err(CalicoError::InvalidRequest(_))
        ));
        assert_eq!(server.await.unwrap(), None);
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = CalicoClient::new(
            "https://calico-api:5443/".to_string(),
            Some("token".to_string()),
            ClientOptions::default(),
        )
        .unwrap();
        assert_eq!(client.base_url(), "https://calico-api:5443");
    }
}
