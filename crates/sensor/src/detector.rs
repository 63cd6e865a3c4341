//! Sailing event detector
//!
//! A sliding window of (t, gyro, boomNorm, roll) samples is checked on
//! every new sample against four rules, in order: crash gybe, normal
//! gybe, tack, boom hit. The first match is emitted and a refractory
//! period suppresses further events. Listeners run each in their own
//! thread, so a failing listener cannot take down its peers or the
//! detector.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{DateTime, TimeZone, Utc};
use contracts::{DetectorThresholds, Event, EventKind, TackDirection};
use observability::record_event_emitted;
use tracing::info;

/// Event callback type
pub type EventListener = Arc<dyn Fn(Event) + Send + Sync>;

/// Token returned by `add_listener`, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

/// Gyro margin above the crash threshold that qualifies as a boom hit
const BOOM_HIT_GY_MARGIN: f64 = 20.0;

/// Dead band subtracted from the measured settling deviation
const OVERSHOOT_DEADBAND: f64 = 0.05;

/// Rule-based sailing event detector
pub struct EventDetector {
    thresholds: DetectorThresholds,
    max_buffer: usize,
    inner: Mutex<DetectorInner>,
}

struct DetectorInner {
    buffer: VecDeque<Sample>,
    last_event_time: f64,
    listeners: HashMap<u64, EventListener>,
    next_listener_id: u64,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    t: f64,
    gyro: f64,
    boom_norm: f64,
    roll: f64,
}

/// Window statistics over a horizon
struct SpanStats {
    dt: f64,
    gy_peak: f64,
    boom_delta: f64,
    roll_drop: f64,
    bn_series: Vec<f64>,
}

impl EventDetector {
    pub fn new(thresholds: DetectorThresholds, max_buffer: usize) -> Self {
        Self {
            thresholds,
            max_buffer: max_buffer.max(2),
            inner: Mutex::new(DetectorInner {
                buffer: VecDeque::with_capacity(max_buffer),
                last_event_time: -1e9,
                listeners: HashMap::new(),
                next_listener_id: 0,
            }),
        }
    }

    /// Register an event callback; keep the handle to remove it later
    pub fn add_listener(&self, listener: EventListener) -> ListenerHandle {
        let mut inner = self.inner.lock().expect("detector lock poisoned");
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.insert(id, listener);
        ListenerHandle(id)
    }

    pub fn remove_listener(&self, handle: ListenerHandle) -> bool {
        self.inner
            .lock()
            .expect("detector lock poisoned")
            .listeners
            .remove(&handle.0)
            .is_some()
    }

    /// Feed one sample; returns the event if one was emitted
    pub fn on_sample(
        &self,
        timestamp: DateTime<Utc>,
        gyro_y: f64,
        boom_norm: f64,
        roll: f64,
    ) -> Option<Event> {
        let t = timestamp.timestamp_micros() as f64 / 1e6;

        let mut inner = self.inner.lock().expect("detector lock poisoned");

        inner.buffer.push_back(Sample {
            t,
            gyro: gyro_y,
            boom_norm,
            roll,
        });
        if inner.buffer.len() > self.max_buffer {
            inner.buffer.pop_front();
        }

        self.maybe_emit(&mut inner, t)
    }

    fn maybe_emit(&self, inner: &mut DetectorInner, t_now: f64) -> Option<Event> {
        if (t_now - inner.last_event_time) < self.thresholds.refractory {
            return None;
        }

        let event = self
            .check_crash_gybe(inner, t_now)
            .or_else(|| self.check_normal_gybe(inner, t_now))
            .or_else(|| self.check_tack(inner, t_now))
            .or_else(|| self.check_boom_hit(inner, t_now))?;

        inner.last_event_time = t_now;
        Self::publish(inner, event);
        Some(event)
    }

    fn check_crash_gybe(&self, inner: &DetectorInner, t_now: f64) -> Option<Event> {
        let span = span_in(&inner.buffer, t_now, self.thresholds.crash_dt);

        if span.gy_peak >= self.thresholds.crash_gy_dps
            && span.boom_delta >= self.thresholds.boom_step_crash
        {
            return Some(base_event(EventKind::GybeCrash, t_now, &span));
        }
        None
    }

    fn check_normal_gybe(&self, inner: &DetectorInner, t_now: f64) -> Option<Event> {
        let span = span_in(&inner.buffer, t_now, self.thresholds.normal_dt);

        if span.gy_peak >= self.thresholds.normal_gy_min
            && span.gy_peak < self.thresholds.crash_gy_dps
            && span.boom_delta >= self.thresholds.boom_step_normal
        {
            return Some(base_event(EventKind::GybeNormal, t_now, &span));
        }
        None
    }

    fn check_tack(&self, inner: &DetectorInner, t_now: f64) -> Option<Event> {
        let span = span_in(&inner.buffer, t_now, self.thresholds.tack_dt_max);

        if span.gy_peak >= self.thresholds.tack_gy_min
            && span.gy_peak <= self.thresholds.tack_gy_max
            && span.boom_delta >= self.thresholds.tack_boom_step
            && span.roll_drop >= self.thresholds.tack_min_roll_delta
        {
            let direction = tack_direction(&span.bn_series);
            let overshoot = settle_overshoot(&span.bn_series);
            let score = tack_quality_score(span.dt, span.gy_peak, span.roll_drop, overshoot);

            let mut event = base_event(EventKind::Tack, t_now, &span);
            event.direction = direction;
            event.overshoot = overshoot;
            event.score = score;
            return Some(event);
        }
        None
    }

    fn check_boom_hit(&self, inner: &DetectorInner, t_now: f64) -> Option<Event> {
        let span = span_in(&inner.buffer, t_now, self.thresholds.roll_dt);

        if span.gy_peak >= self.thresholds.crash_gy_dps + BOOM_HIT_GY_MARGIN
            && span.roll_drop >= self.thresholds.roll_hit
        {
            return Some(base_event(EventKind::BoomHit, t_now, &span));
        }
        None
    }

    /// Notify listeners, each in its own thread
    fn publish(inner: &DetectorInner, event: Event) {
        info!(
            kind = %event.kind,
            gyro_peak = event.gyro_peak,
            boom_delta = event.boom_delta,
            roll_delta = event.roll_delta,
            duration = event.duration,
            score = event.score,
            "sailing event detected"
        );
        record_event_emitted(&event.kind.to_string());

        for listener in inner.listeners.values() {
            let listener = Arc::clone(listener);
            // A panicking listener only kills its own thread
            thread::spawn(move || listener(event));
        }
    }
}

fn base_event(kind: EventKind, t_now: f64, span: &SpanStats) -> Event {
    Event {
        kind,
        timestamp: Utc
            .timestamp_micros((t_now * 1e6) as i64)
            .single()
            .unwrap_or_else(Utc::now),
        gyro_peak: span.gy_peak,
        boom_delta: span.boom_delta,
        roll_delta: span.roll_drop,
        duration: span.dt,
        direction: None,
        overshoot: 0.0,
        score: 0.0,
        wind_speed: 0.0,
        wind_angle: 0.0,
    }
}

/// Statistics over samples with `t >= t_now - horizon`
fn span_in(buffer: &VecDeque<Sample>, t_now: f64, horizon: f64) -> SpanStats {
    let t0 = (t_now - horizon).max(0.0);
    let sub: Vec<&Sample> = buffer.iter().filter(|s| s.t >= t0).collect();

    let mut stats = SpanStats {
        dt: 0.0,
        gy_peak: 0.0,
        boom_delta: 0.0,
        roll_drop: 0.0,
        bn_series: Vec::new(),
    };

    let (Some(first), Some(last)) = (sub.first(), sub.last()) else {
        return stats;
    };
    stats.dt = last.t - first.t;

    for s in &sub {
        stats.gy_peak = stats.gy_peak.max(s.gyro.abs());
    }

    // Boom travel over valid samples only
    stats.bn_series = sub
        .iter()
        .map(|s| s.boom_norm)
        .filter(|v| v.is_finite())
        .collect();
    if stats.bn_series.len() >= 2 {
        let min = stats.bn_series.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = stats.bn_series.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        stats.boom_delta = max - min;
    }

    // Largest roll decrease across any ordered pair
    let rl_series: Vec<f64> = sub
        .iter()
        .map(|s| s.roll)
        .filter(|v| v.is_finite())
        .collect();
    if rl_series.len() >= 2 {
        let mut running_max = f64::NEG_INFINITY;
        for &roll in &rl_series {
            running_max = running_max.max(roll);
            stats.roll_drop = stats.roll_drop.max(running_max - roll);
        }
    }

    stats
}

/// Sign change from first to last valid boom position
fn tack_direction(bn_series: &[f64]) -> Option<TackDirection> {
    let (first, last) = (bn_series.first()?, bn_series.last()?);
    if bn_series.len() < 2 {
        return None;
    }
    if *first > 0.0 && *last < 0.0 {
        Some(TackDirection::StbToPort)
    } else if *first < 0.0 && *last > 0.0 {
        Some(TackDirection::PortToStb)
    } else {
        None
    }
}

/// Max deviation from the settled position over the final third, minus a
/// dead band
fn settle_overshoot(bn_series: &[f64]) -> f64 {
    let len = bn_series.len();
    if len < 4 {
        return 0.0;
    }

    // Settled target: mean of the last quarter
    let tail_n = ((len as f64 / 4.0).max(2.0) as usize).min(len);
    let tail = &bn_series[len - tail_n..];
    let target = tail.iter().sum::<f64>() / tail.len() as f64;

    // Max deviation over the last third
    let third_n = ((len as f64 / 3.0).max(5.0) as usize).min(len);
    let max_dev = bn_series[len - third_n..]
        .iter()
        .map(|v| (v - target).abs())
        .fold(0.0, f64::max);

    (max_dev - OVERSHOOT_DEADBAND).max(0.0)
}

/// Tack quality score 0-100, rounded to 0.1
fn tack_quality_score(dt: f64, gy_peak: f64, roll_drop: f64, overshoot: f64) -> f64 {
    // Faster is better, target ~1.6 s
    let t_comp = (40.0 * 1.6 / dt.max(0.6)).max(0.0);

    // A smooth ~55 deg/s swing is optimal
    let gy_comp = (30.0 * (1.0 - (gy_peak - 55.0).abs() / 55.0)).max(0.0);

    // More heel change is better, up to 25 deg
    let rl_comp = (20.0 * roll_drop.min(25.0) / 25.0).max(0.0);

    // Less settling overshoot is better
    let os_comp = (10.0 * (1.0 - (overshoot / 0.25).min(1.0))).max(0.0);

    let score = t_comp + gy_comp + rl_comp + os_comp;
    ((score * 10.0).round() / 10.0).min(100.0)
}
