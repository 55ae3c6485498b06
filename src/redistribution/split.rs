//! Replica split with remainder semantics.

use serde::Serialize;

/// Replicas assigned to one target host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub host: String,
    pub replicas: u32,
}

/// Split `total` replicas across `hosts` in the given order.
///
/// Every host receives `total / k`; the first `total % k` hosts receive one
/// more. Returns an empty plan when `hosts` is empty.
pub fn split_replicas(total: u32, hosts: &[String]) -> Vec<Placement> {
    let Ok(k) = u32::try_from(hosts.len()) else {
        return Vec::new();
    };
    if k == 0 {
        return Vec::new();
    }

    let base = total / k;
    let remainder = (total % k) as usize;

    hosts
        .iter()
        .enumerate()
        .map(|(i, host)| Placement {
            host: host.clone(),
            replicas: if i < remainder { base + 1 } else { base },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_seven_over_two() {
        let plan = split_replicas(7, &hosts(&["A", "C"]));
        assert_eq!(
            plan,
            vec![
                Placement { host: "A".into(), replicas: 4 },
                Placement { host: "C".into(), replicas: 3 },
            ]
        );
    }

    #[test]
    fn test_fewer_replicas_than_hosts() {
        let plan = split_replicas(2, &hosts(&["a", "b", "c", "d"]));
        let shares: Vec<_> = plan.iter().map(|p| p.replicas).collect();
        assert_eq!(shares, vec![1, 1, 0, 0]);
    }

    #[test]
    fn test_no_hosts() {
        assert!(split_replicas(5, &[]).is_empty());
    }

    #[test]
    fn test_split_invariants() {
        let names = hosts(&["h1", "h2", "h3", "h4", "h5", "h6", "h7"]);
        for k in 1..=names.len() {
            for total in [0u32, 1, 5, 6, 7, 13, 100, 1001] {
                let plan = split_replicas(total, &names[..k]);
                assert_eq!(plan.len(), k);

                let sum: u32 = plan.iter().map(|p| p.replicas).sum();
                assert_eq!(sum, total, "total={total} k={k}");

                let max = plan.iter().map(|p| p.replicas).max().unwrap();
                let min = plan.iter().map(|p| p.replicas).min().unwrap();
                assert!(max - min <= 1, "total={total} k={k}");

                let larger = plan.iter().filter(|p| p.replicas == total / k as u32 + 1).count();
                assert_eq!(larger, (total % k as u32) as usize, "total={total} k={k}");
            }
        }
    }
}
