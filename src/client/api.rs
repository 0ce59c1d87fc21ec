//! Marketplace API
//!
//! Reads go through the [`EndpointProber`] and come back as normalized
//! records. Writes hit exactly one endpoint and either succeed or fail
//! outright; they never fall back.

use super::prober::EndpointProber;
use super::routes::{self, LogicalRead, WriteRoute};
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::model::normalize::{self, CROP_LIST_FIELDS, HARVEST_LIST_FIELDS, PRODUCT_LIST_FIELDS};
use crate::model::{
    validate_order, CropRecord, CropStatus, EntityId, HarvestRecord, NewHarvest, NewProduct,
    OrderItem, ProductRecord,
};
use crate::transport::{Request, Transport};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Typed access to the marketplace backend
pub struct MarketplaceApi<T> {
    prober: EndpointProber<T>,
    clock: Arc<dyn Clock>,
}

impl<T: Transport> MarketplaceApi<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            prober: EndpointProber::new(config, transport),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for ids synthesized on the client
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        self.prober.config()
    }

    pub fn transport(&self) -> &T {
        self.prober.transport()
    }

    pub fn prober(&self) -> &EndpointProber<T> {
        &self.prober
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn my_harvests(&self, token: Option<&str>) -> Result<Vec<HarvestRecord>> {
        let body = self.read(&routes::MY_HARVESTS, &[], token).await?;
        normalize::normalize_list(&body, HARVEST_LIST_FIELDS, normalize::normalize_harvest)
    }

    pub async fn my_crops(&self, token: Option<&str>) -> Result<Vec<CropRecord>> {
        let body = self.read(&routes::MY_CROPS, &[], token).await?;
        normalize::normalize_list(&body, CROP_LIST_FIELDS, normalize::normalize_crop)
    }

    pub async fn crop_by_id(&self, id: &EntityId, token: Option<&str>) -> Result<CropRecord> {
        let body = self.read(&routes::CROP_BY_ID, &[("id", id.as_str())], token).await?;
        normalize::normalize_crop(unwrap_data(&body))
    }

    pub async fn products(&self, token: Option<&str>) -> Result<Vec<ProductRecord>> {
        let body = self.read(&routes::PRODUCTS, &[], token).await?;
        normalize::normalize_list(&body, PRODUCT_LIST_FIELDS, normalize::normalize_product)
    }

    pub async fn unread_notification_count(&self, token: Option<&str>) -> Result<u64> {
        let body = self.read(&routes::UNREAD_NOTIFICATION_COUNT, &[], token).await?;
        normalize::normalize_count(&body)
    }

    /// Number of sales, from a report object or a plain list of sales
    pub async fn sales_count(&self, token: Option<&str>) -> Result<u64> {
        let body = self.read(&routes::SALES_REPORT, &[], token).await?;
        match &body {
            Value::Array(sales) => Ok(sales.len() as u64),
            _ => normalize::normalize_count(&body),
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Publish a product; `None` when the server accepted it without echoing it
    pub async fn create_product(
        &self,
        product: &NewProduct,
        token: Option<&str>,
    ) -> Result<Option<ProductRecord>> {
        product.validate()?;
        let echo = self
            .write(&routes::CREATE_PRODUCT, &[], Some(serde_json::to_value(product)?), token)
            .await?;
        echo.as_ref()
            .filter(|body| body.is_object())
            .map(|body| normalize::normalize_product(unwrap_data(body)))
            .transpose()
    }

    /// Register a harvest.
    ///
    /// Returns the server's echo when it sends one back, otherwise the payload
    /// itself under an id derived from the current time.
    pub async fn create_harvest(
        &self,
        harvest: NewHarvest,
        token: Option<&str>,
    ) -> Result<HarvestRecord> {
        harvest.validate()?;
        let echo = self
            .write(&routes::CREATE_HARVEST, &[], Some(serde_json::to_value(&harvest)?), token)
            .await?;

        if let Some(record) = echo
            .as_ref()
            .and_then(|body| normalize::normalize_harvest(unwrap_data(body)).ok())
        {
            return Ok(record);
        }

        let id = EntityId::from(self.clock.now().timestamp_millis());
        debug!(entity_id = %id, "Server did not echo the harvest, using a local id");
        Ok(harvest.into_record(id))
    }

    /// Replace a harvest's fields. Returns the server's echo, or the payload
    /// under `id` when the server sends nothing back.
    pub async fn update_harvest(
        &self,
        id: &EntityId,
        harvest: NewHarvest,
        token: Option<&str>,
    ) -> Result<HarvestRecord> {
        harvest.validate()?;
        let echo = self
            .write(
                &routes::UPDATE_HARVEST,
                &[("id", id.as_str())],
                Some(serde_json::to_value(&harvest)?),
                token,
            )
            .await?;

        let echoed = echo
            .as_ref()
            .and_then(|body| normalize::normalize_harvest(unwrap_data(body)).ok())
            .filter(|record| &record.id == id);
        Ok(echoed.unwrap_or_else(|| harvest.into_record(id.clone())))
    }

    pub async fn delete_harvest(&self, id: &EntityId, token: Option<&str>) -> Result<()> {
        self.write(&routes::DELETE_HARVEST, &[("id", id.as_str())], None, token)
            .await?;
        Ok(())
    }

    pub async fn place_order(&self, items: &[OrderItem], token: Option<&str>) -> Result<Option<Value>> {
        validate_order(items)?;
        self.write(&routes::PLACE_ORDER, &[], Some(json!({ "items": items })), token)
            .await
    }

    pub async fn update_crop_status(
        &self,
        id: &EntityId,
        status: &CropStatus,
        token: Option<&str>,
    ) -> Result<()> {
        self.write(
            &routes::UPDATE_CROP_STATUS,
            &[("id", id.as_str())],
            Some(json!({ "status": status.as_label() })),
            token,
        )
        .await?;
        Ok(())
    }

    /// Add `delta` units to (or remove them from) a product's stock
    pub async fn adjust_stock(&self, id: &EntityId, delta: i64, token: Option<&str>) -> Result<()> {
        if delta == 0 {
            return Err(ClientError::ValidationFailed(
                "stock adjustment must not be zero".to_string(),
            ));
        }
        self.write(
            &routes::ADJUST_STOCK,
            &[("id", id.as_str())],
            Some(json!({ "delta": delta })),
            token,
        )
        .await?;
        Ok(())
    }

    pub async fn mark_notification_read(&self, id: &EntityId, token: Option<&str>) -> Result<()> {
        self.write(&routes::MARK_NOTIFICATION_READ, &[("id", id.as_str())], None, token)
            .await?;
        Ok(())
    }

    // === Private Implementation ===

    async fn read(
        &self,
        read: &LogicalRead,
        params: &[(&str, &str)],
        token: Option<&str>,
    ) -> Result<Value> {
        Ok(self.prober.probe(read, params, token).await?.body)
    }

    async fn write(
        &self,
        route: &WriteRoute,
        params: &[(&str, &str)],
        body: Option<Value>,
        token: Option<&str>,
    ) -> Result<Option<Value>> {
        let path = route.render(params);
        let mut request = Request::get(self.config().url_for(&path))
            .with_method(route.method)
            .with_bearer(token);
        if let Some(body) = body {
            request = request.with_json(body);
        }

        let response = self
            .transport()
            .execute(request)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !response.is_success() {
            warn!(operation = route.name, path = %path, status = response.status, "Write rejected");
            return Err(ClientError::rejected(response.status, response.body.as_deref()));
        }

        info!(operation = route.name, path = %path, status = response.status, "Write accepted");
        Ok(response.json())
    }
}

/// Single-entity responses are sometimes wrapped in `{"data": {...}}`
fn unwrap_data(body: &Value) -> &Value {
    match body.get("data") {
        Some(inner) if inner.is_object() => inner,
        _ => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::transport::{Method, MockTransport};
    use chrono::{TimeZone, Utc};

    fn api() -> MarketplaceApi<MockTransport> {
        MarketplaceApi::new(ClientConfig::default(), MockTransport::new())
    }

    fn url(path: &str) -> String {
        ClientConfig::default().url_for(path)
    }

    fn new_harvest() -> NewHarvest {
        NewHarvest {
            crop_id: EntityId::from(3),
            harvest_date: "2024-06-01".into(),
            quantity_harvested: 12.0,
            unit_of_measure: "kg".into(),
            quality_notes: "ALTA".into(),
            product_id: None,
        }
    }

    #[tokio::test]
    async fn test_my_harvests_normalizes_paged_body() {
        let api = api();
        api.transport().respond_json(
            Method::Get,
            &url("cosechas/mis-cosechas"),
            200,
            json!({"content": [{"id": 1, "cantidad": 5}, {"id": 2, "quantity": 7}]}),
        );

        let harvests = api.my_harvests(Some("t")).await.unwrap();
        assert_eq!(harvests.len(), 2);
        assert_eq!(harvests[1].quantity_harvested, 7.0);
    }

    #[tokio::test]
    async fn test_crop_by_id_uses_templated_candidates() {
        let api = api();
        api.transport()
            .respond(Method::Get, &url("cultivos/5"), 404, None)
            .respond_json(Method::Get, &url("crops/5"), 200, json!({"data": {"id": 5, "name": "Papa"}}));

        let crop = api.crop_by_id(&EntityId::from(5), None).await.unwrap();
        assert_eq!(crop.name, "Papa");
    }

    #[tokio::test]
    async fn test_sales_count_accepts_list_or_object() {
        let api = api();
        api.transport()
            .respond_json(Method::Get, &url("reportes/ventas"), 200, json!([{}, {}, {}]));
        assert_eq!(api.sales_count(None).await.unwrap(), 3);

        let api = self::api();
        api.transport().respond_json(
            Method::Get,
            &url("reportes/ventas"),
            200,
            json!({"totalSalesCount": 9}),
        );
        assert_eq!(api.sales_count(None).await.unwrap(), 9);
    }

    fn new_product() -> NewProduct {
        NewProduct {
            name: "Tomato".into(),
            description: "Cherry".into(),
            price_per_unit: 2.5,
            unit_of_measure: "kg".into(),
            available_stock: 40,
        }
    }

    #[tokio::test]
    async fn test_products_fall_through_to_second_route() {
        let api = api();
        api.transport()
            .respond(Method::Get, &url("productos"), 404, None)
            .respond_json(
                Method::Get,
                &url("products"),
                200,
                json!({"productos": [
                    {"productoId": 7, "nombre": "Tomate", "precio": "2.5", "stockDisponible": 10.7,
                     "agricultor": {"email": "ana@farm.test"}},
                    {"nombre": "No id"},
                    {"id": 8, "name": "Onion", "pricePerUnit": 1, "stock": -3},
                ]}),
            );

        let products = api.products(Some("t")).await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, EntityId::from(7));
        assert_eq!(products[0].name, "Tomate");
        assert_eq!(products[0].price_per_unit, 2.5);
        assert_eq!(products[0].available_stock, Some(10));
        assert_eq!(products[0].owner_contact.as_deref(), Some("ana@farm.test"));
        assert_eq!(products[1].available_stock, Some(0));
        assert_eq!(
            api.transport().requested_urls(),
            vec![url("productos"), url("products")]
        );
    }

    #[tokio::test]
    async fn test_create_product_returns_echo() {
        let api = api();
        api.transport().respond_json(
            Method::Post,
            &url("productos"),
            201,
            json!({"data": {"id": 12, "name": "Tomato", "pricePerUnit": 2.5, "availableStock": 40}}),
        );

        let created = api.create_product(&new_product(), Some("t")).await.unwrap().unwrap();
        assert_eq!(created.id, EntityId::from(12));
        assert_eq!(created.available_stock, Some(40));

        let sent = &api.transport().requests()[0];
        assert_eq!(sent.bearer.as_deref(), Some("t"));
        assert_eq!(
            sent.body,
            Some(json!({
                "name": "Tomato",
                "description": "Cherry",
                "pricePerUnit": 2.5,
                "unitOfMeasure": "kg",
                "availableStock": 40
            }))
        );
    }

    #[tokio::test]
    async fn test_create_product_without_echo_is_none() {
        let api = api();
        api.transport().respond(Method::Post, &url("productos"), 204, None);
        assert_eq!(api.create_product(&new_product(), None).await.unwrap(), None);

        let api = self::api();
        api.transport()
            .respond(Method::Post, &url("productos"), 200, Some("\"created\""));
        assert_eq!(api.create_product(&new_product(), None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_product_rejection_and_validation() {
        let api = api();
        api.transport().respond(Method::Post, &url("productos"), 400, None);
        let err = api.create_product(&new_product(), None).await.unwrap_err();
        assert_eq!(err.status(), Some(400));

        let mut invalid = new_product();
        invalid.price_per_unit = -1.0;
        let err = api.create_product(&invalid, None).await.unwrap_err();
        assert!(matches!(err, ClientError::ValidationFailed(_)));
        assert_eq!(api.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_update_harvest_uses_id_route() {
        let api = api();
        api.transport().respond(Method::Put, &url("cosechas/31"), 204, None);

        let record = api
            .update_harvest(&EntityId::from(31), new_harvest(), Some("t"))
            .await
            .unwrap();
        assert_eq!(record.id, EntityId::from(31));
        assert_eq!(record.quantity_harvested, 12.0);

        let sent = &api.transport().requests()[0];
        assert_eq!(sent.method, Method::Put);
        assert_eq!(sent.body.as_ref().unwrap()["qualityNotes"], "ALTA");
    }

    #[tokio::test]
    async fn test_delete_harvest() {
        let api = api();
        api.transport()
            .respond(Method::Delete, &url("cosechas/31"), 204, None)
            .respond(Method::Delete, &url("cosechas/32"), 404, None);

        api.delete_harvest(&EntityId::from(31), None).await.unwrap();
        let err = api.delete_harvest(&EntityId::from(32), None).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_create_harvest_prefers_server_echo() {
        let api = api();
        api.transport().respond_json(
            Method::Post,
            &url("cosechas"),
            201,
            json!({"id": 77, "cropId": 3, "quantityHarvested": 12}),
        );

        let record = api.create_harvest(new_harvest(), Some("t")).await.unwrap();
        assert_eq!(record.id, EntityId::from(77));

        let sent = &api.transport().requests()[0];
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.body.as_ref().unwrap()["quantityHarvested"], 12.0);
    }

    #[tokio::test]
    async fn test_create_harvest_synthesizes_id_without_echo() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let api = api().with_clock(Arc::new(ManualClock::new(start)));
        api.transport().respond(Method::Post, &url("cosechas"), 204, None);

        let record = api.create_harvest(new_harvest(), None).await.unwrap();
        assert_eq!(record.id, EntityId::from(start.timestamp_millis()));
        assert_eq!(record.quality_notes, "ALTA");
    }

    #[tokio::test]
    async fn test_validation_runs_before_network() {
        let api = api();
        let mut harvest = new_harvest();
        harvest.quantity_harvested = 0.0;

        let err = api.create_harvest(harvest, None).await.unwrap_err();
        assert!(matches!(err, ClientError::ValidationFailed(_)));
        assert!(api.place_order(&[], None).await.is_err());
        assert!(api.adjust_stock(&EntityId::from(1), 0, None).await.is_err());
        assert!(api.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_write_rejection_carries_server_message() {
        let api = api();
        api.transport().respond(
            Method::Post,
            &url("pedidos"),
            409,
            Some(r#"{"message": "Insufficient stock"}"#),
        );

        let err = api.place_order(&[OrderItem::new(7, 3)], Some("t")).await.unwrap_err();
        assert_eq!(err.user_message(), "Insufficient stock");
        assert_eq!(api.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_write_auth_rejection() {
        let api = api();
        api.transport().respond(Method::Put, &url("cultivos/4/estado"), 401, None);

        let err = api
            .update_crop_status(&EntityId::from(4), &CropStatus::Harvested, Some("old"))
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::Unauthorized { status: 401 });
    }

    #[tokio::test]
    async fn test_update_crop_status_sends_label() {
        let api = api();
        api.transport().respond(Method::Put, &url("cultivos/4/estado"), 200, None);

        api.update_crop_status(&EntityId::from(4), &CropStatus::Harvested, None)
            .await
            .unwrap();
        let sent = &api.transport().requests()[0];
        assert_eq!(sent.body, Some(json!({"status": "COSECHADO"})));
    }

    #[tokio::test]
    async fn test_writes_never_probe() {
        let api = api();
        api.transport().unreachable(Method::Put, &url("notificaciones/1/leida"));

        let err = api
            .mark_notification_read(&EntityId::from(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(api.transport().requests().len(), 1);
    }
}
