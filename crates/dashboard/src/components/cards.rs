//! KPI and chart card view models.
//!
//! Each card renders exactly one of: data, an inline error, or an empty
//! state. A failing widget never takes the rest of the page down with it.

use std::sync::Arc;

use serde::Serialize;

use super::format;
use crate::api::ApiError;
use crate::api::types::{DailySeries, Kpis};

/// What a card shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardBody {
    /// Series JSON for the chart script, safe to embed in a `<script>` block.
    Data(String),
    Error(String),
    Empty,
}

/// Which chart the client-side script draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Revenue,
    CustomerGrowth,
    ProductGrowth,
    Funnel,
}

impl ChartKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::CustomerGrowth => "customer-growth",
            Self::ProductGrowth => "product-growth",
            Self::Funnel => "funnel",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Revenue => "Revenue, Orders & AOV",
            Self::CustomerGrowth => "Customer Growth",
            Self::ProductGrowth => "Product Growth",
            Self::Funnel => "Checkout Funnel & Abandonment",
        }
    }
}

/// One chart on the analytics page.
#[derive(Debug, Clone)]
pub struct ChartCard {
    pub kind: ChartKind,
    pub body: CardBody,
}

impl ChartCard {
    /// Build a card from a (possibly failed) series read.
    #[must_use]
    pub fn from_result<P: Serialize>(
        kind: ChartKind,
        result: &Result<Arc<DailySeries<P>>, ApiError>,
    ) -> Self {
        let body = match result {
            Err(e) => CardBody::Error(e.user_message()),
            Ok(series) if series.is_empty() => CardBody::Empty,
            Ok(series) => match embed_json(&series.daily) {
                Ok(json) => CardBody::Data(json),
                Err(e) => {
                    tracing::error!(error = %e, chart = kind.as_str(), "Failed to encode chart data");
                    CardBody::Error("Could not display this chart.".to_owned())
                }
            },
        };
        Self { kind, body }
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        self.kind.title()
    }

    #[must_use]
    pub fn data(&self) -> Option<&str> {
        match &self.body {
            CardBody::Data(json) => Some(json),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.body {
            CardBody::Error(message) => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.body, CardBody::Empty)
    }
}

/// Serialize for embedding inside a `<script type="application/json">`.
fn embed_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

/// One headline figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiCard {
    pub title: &'static str,
    pub value: String,
    pub hint: Option<&'static str>,
}

/// The row of KPI cards at the top of the analytics page.
#[derive(Debug, Clone)]
pub struct KpiPanel {
    pub cards: Vec<KpiCard>,
    pub error: Option<String>,
}

impl KpiPanel {
    #[must_use]
    pub fn from_result(result: &Result<Arc<Kpis>, ApiError>, currency_symbol: &str) -> Self {
        match result {
            Ok(kpis) => Self {
                cards: kpi_cards(kpis, currency_symbol),
                error: None,
            },
            Err(e) => Self {
                cards: Vec::new(),
                error: Some(e.user_message()),
            },
        }
    }
}

fn kpi_cards(kpis: &Kpis, symbol: &str) -> Vec<KpiCard> {
    let show = |value: Option<f64>, render: &dyn Fn(f64) -> String| {
        value.map_or_else(|| format::MISSING.to_owned(), render)
    };
    let money = |v: f64| format::currency(symbol, v);

    vec![
        KpiCard {
            title: "Revenue",
            value: show(kpis.total_revenue, &money),
            hint: None,
        },
        KpiCard {
            title: "Orders",
            value: show(kpis.total_orders, &format::count),
            hint: None,
        },
        KpiCard {
            title: "Customers",
            value: show(kpis.total_customers, &format::count),
            hint: None,
        },
        KpiCard {
            title: "Avg. Order Value",
            value: show(kpis.average_order_value, &money),
            hint: Some("Revenue divided by orders in the window"),
        },
        KpiCard {
            title: "New Customers",
            value: show(kpis.new_customers, &format::count),
            hint: None,
        },
        KpiCard {
            title: "Repeat Rate",
            value: show(kpis.repeat_customer_rate, &format::percent),
            hint: Some("Share of customers with more than one order"),
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::StatusCode;

    use super::*;
    use crate::api::types::{RevenueOverTime, RevenuePoint};

    fn revenue(points: Vec<RevenuePoint>) -> Result<Arc<RevenueOverTime>, ApiError> {
        Ok(Arc::new(DailySeries { daily: points }))
    }

    #[test]
    fn test_chart_card_states() {
        let empty = ChartCard::from_result(ChartKind::Revenue, &revenue(vec![]));
        assert!(empty.is_empty());

        let failed: Result<Arc<RevenueOverTime>, ApiError> = Err(ApiError::from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            br#"{"message":"metrics unavailable"}"#,
        ));
        let failed = ChartCard::from_result(ChartKind::Revenue, &failed);
        assert_eq!(failed.error(), Some("metrics unavailable"));

        let data = ChartCard::from_result(
            ChartKind::Revenue,
            &revenue(vec![RevenuePoint {
                day: "</script>".to_owned(),
                revenue: 10.0,
                orders: 1.0,
                aov: 10.0,
            }]),
        );
        let json = data.data().unwrap();
        assert!(!json.contains("</script>"));
        assert!(json.contains("\\u003c/script\\u003e"));
    }

    #[test]
    fn test_kpi_panel_formats_units() {
        let kpis: Kpis = serde_json::from_str(
            r#"{"total_revenue":"1234.5","total_orders":12,"average_order_value":102.876,"repeat_customer_rate":0.25}"#,
        )
        .unwrap();
        let panel = KpiPanel::from_result(&Ok(Arc::new(kpis)), "₹");

        assert!(panel.error.is_none());
        let value = |title: &str| {
            panel
                .cards
                .iter()
                .find(|c| c.title == title)
                .map(|c| c.value.clone())
                .unwrap()
        };
        assert_eq!(value("Revenue"), "₹1,234.50");
        assert_eq!(value("Orders"), "12");
        assert_eq!(value("Avg. Order Value"), "₹102.88");
        assert_eq!(value("Repeat Rate"), "25.0%");
        assert_eq!(value("Customers"), format::MISSING);
    }
}
