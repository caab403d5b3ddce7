//! Estadísticas del panel

use std::collections::HashMap;

use crate::models::esim::{EsimRecord, Estado, Producto};
use crate::models::stats::{DashboardStats, LabelCount};

/// Pools de ip mostrados en el ranking
pub const TOP_IPS: usize = 10;

/// Métricas globales sobre `all` y el conteo del listado filtrado.
///
/// `por_estado` y `por_producto` siempre incluyen todos los valores
/// posibles, aunque su conteo sea cero.
pub fn dashboard_stats(all: &[EsimRecord], filtered: &[EsimRecord]) -> DashboardStats {
    let count_estado = |estado: Estado| all.iter().filter(|r| r.estado == estado).count();
    let count_producto = |producto: Producto| all.iter().filter(|r| r.producto == producto).count();

    let por_estado = Estado::ALL
        .iter()
        .map(|e| LabelCount::new(e.as_str(), count_estado(*e)))
        .collect();
    let por_producto = Producto::ALL
        .iter()
        .map(|p| LabelCount::new(p.as_str(), count_producto(*p)))
        .collect();

    DashboardStats {
        total: all.len(),
        disponibles: count_estado(Estado::Disponible),
        usadas: count_estado(Estado::Usado),
        filtrados: filtered.len(),
        por_estado,
        por_producto,
        top_ips: top_ips(all, TOP_IPS),
    }
}

/// Pools con más eSIMs; empates por nombre ascendente
fn top_ips(records: &[EsimRecord], limit: usize) -> Vec<LabelCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for ip in records.iter().filter_map(|r| r.ip.as_deref()) {
        if !ip.trim().is_empty() {
            *counts.entry(ip).or_default() += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(ip, count)| LabelCount::new(ip, count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, ip: Option<&str>, producto: Producto, estado: Estado) -> EsimRecord {
        EsimRecord {
            id,
            iccid: format!("ICCID{}", id),
            msisdn: format!("MSISDN{}", id),
            imsi: None,
            pin: None,
            puk: None,
            serie: None,
            asignado_a: None,
            distribuidor: None,
            ip: ip.map(str::to_string),
            producto,
            estado,
            fecha_creacion: None,
            fecha_ultimo_cambio: None,
            image_index: None,
        }
    }

    #[test]
    fn test_counts() {
        let all = vec![
            record(1, Some("CB127"), Producto::Mov, Estado::Disponible),
            record(2, Some("CB127"), Producto::Mov, Estado::Usado),
            record(3, Some("AA1"), Producto::Mov, Estado::Disponible),
            record(4, None, Producto::Mov, Estado::Disponible),
        ];
        let stats = dashboard_stats(&all, &all[..1]);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.disponibles, 3);
        assert_eq!(stats.usadas, 1);
        assert_eq!(stats.filtrados, 1);
        assert_eq!(stats.por_producto[1], LabelCount::new("IP", 0));
        assert_eq!(
            stats.top_ips,
            vec![LabelCount::new("CB127", 2), LabelCount::new("AA1", 1)]
        );
    }

    #[test]
    fn test_top_ips_limited_to_ten() {
        let all: Vec<_> = (0..15)
            .map(|i| record(i, Some(&format!("P{:02}", i)), Producto::Ip, Estado::Usado))
            .collect();
        let stats = dashboard_stats(&all, &[]);
        assert_eq!(stats.top_ips.len(), TOP_IPS);
        assert_eq!(stats.top_ips[0].label, "P00");
        assert_eq!(stats.usadas, 15);
        assert_eq!(stats.filtrados, 0);
    }

    #[test]
    fn test_empty_inventory() {
        let stats = dashboard_stats(&[], &[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.por_estado.len(), 2);
        assert!(stats.top_ips.is_empty());
    }
}
