//! Backend routes
//!
//! The backend's route naming differs between deployments, so each logical
//! read lists every path it has been seen under, most preferred first. Writes
//! are single-endpoint and never probed.

use crate::transport::Method;

/// Ordered candidate paths for one logical read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalRead {
    /// Operation name used in logs and errors
    pub name: &'static str,
    /// Path templates relative to the base URL, in preference order
    pub candidates: &'static [&'static str],
}

impl LogicalRead {
    /// Substitute `{name}` placeholders in every candidate
    pub fn render(&self, params: &[(&str, &str)]) -> Vec<String> {
        self.candidates
            .iter()
            .map(|template| render_template(template, params))
            .collect()
    }
}

/// A single-endpoint write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRoute {
    pub name: &'static str,
    pub method: Method,
    pub path: &'static str,
}

impl WriteRoute {
    pub fn render(&self, params: &[(&str, &str)]) -> String {
        render_template(self.path, params)
    }
}

fn render_template(template: &str, params: &[(&str, &str)]) -> String {
    params.iter().fold(template.to_string(), |path, (name, value)| {
        path.replace(&format!("{{{}}}", name), value)
    })
}

// =============================================================================
// Reads
// =============================================================================

pub const MY_HARVESTS: LogicalRead = LogicalRead {
    name: "my_harvests",
    candidates: &[
        "cosechas/mis-cosechas",
        "cosechas/mias",
        "cosechas/agricultor",
        "harvests/my",
        "cosechas",
    ],
};

pub const MY_CROPS: LogicalRead = LogicalRead {
    name: "my_crops",
    candidates: &[
        "cultivos/mis-cultivos",
        "cultivos/mios",
        "cultivos/agricultor",
        "crops/my",
        "cultivos",
    ],
};

pub const CROP_BY_ID: LogicalRead = LogicalRead {
    name: "crop_by_id",
    candidates: &["cultivos/{id}", "crops/{id}"],
};

pub const PRODUCTS: LogicalRead = LogicalRead {
    name: "products",
    candidates: &["productos", "products"],
};

pub const UNREAD_NOTIFICATION_COUNT: LogicalRead = LogicalRead {
    name: "unread_notification_count",
    candidates: &[
        "notificaciones/no-leidas/count",
        "notificaciones/unread-count",
        "notifications/unread/count",
    ],
};

pub const SALES_REPORT: LogicalRead = LogicalRead {
    name: "sales_report",
    candidates: &["reportes/ventas", "pedidos/mis-ventas", "reports/sales"],
};

// =============================================================================
// Writes
// =============================================================================

pub const CREATE_PRODUCT: WriteRoute = WriteRoute {
    name: "create_product",
    method: Method::Post,
    path: "productos",
};

pub const CREATE_HARVEST: WriteRoute = WriteRoute {
    name: "create_harvest",
    method: Method::Post,
    path: "cosechas",
};

pub const UPDATE_HARVEST: WriteRoute = WriteRoute {
    name: "update_harvest",
    method: Method::Put,
    path: "cosechas/{id}",
};

pub const DELETE_HARVEST: WriteRoute = WriteRoute {
    name: "delete_harvest",
    method: Method::Delete,
    path: "cosechas/{id}",
};

pub const PLACE_ORDER: WriteRoute = WriteRoute {
    name: "place_order",
    method: Method::Post,
    path: "pedidos",
};

pub const UPDATE_CROP_STATUS: WriteRoute = WriteRoute {
    name: "update_crop_status",
    method: Method::Put,
    path: "cultivos/{id}/estado",
};

pub const ADJUST_STOCK: WriteRoute = WriteRoute {
    name: "adjust_stock",
    method: Method::Patch,
    path: "productos/{id}/stock",
};

pub const MARK_NOTIFICATION_READ: WriteRoute = WriteRoute {
    name: "mark_notification_read",
    method: Method::Put,
    path: "notificaciones/{id}/leida",
};
