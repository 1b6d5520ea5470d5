// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::Args;
use cdr::{CdrLe, Infinite};
use clap::Parser as _;
use edgefirst_depthcloud::{
    ColorImage, ColorLayout, ConvertConfig, DepthImage, Error, Intrinsics, IntrinsicsCell,
    depth_to_cloud, to_pointcloud2,
};
use edgefirst_schemas::sensor_msgs::{CameraInfo, Image};
use kanal::{AsyncReceiver, AsyncSender};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, trace, warn};
use tracing_subscriber::{Layer as _, layer::SubscriberExt as _, util::SubscriberInitExt as _};
use zenoh::{
    bytes::{Encoding, ZBytes},
    handlers::FifoChannelHandler,
    pubsub::Subscriber,
    qos::{CongestionControl, Priority},
    sample::Sample,
};

/// Minimum interval between repeated per-frame warnings.
const WARN_PERIOD: Duration = Duration::from_secs(5);

/// Depth frames buffered between the subscriber and the conversion loop.
const DEPTH_QUEUE: usize = 4;

type LatestImage = Arc<RwLock<Option<Image>>>;

/// Rate limiter for warnings raised on every frame.
struct Throttle {
    period: Duration,
    last: Option<Instant>,
}

impl Throttle {
    fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.period => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

// If the receiver is empty, waits for the next message, otherwise returns the
// most recent message on this receiver. If the receiver is closed, returns None
async fn drain_recv<T>(rx: &AsyncReceiver<T>) -> Option<T> {
    let mut msg = match rx.try_recv() {
        Err(_) => return None,
        Ok(Some(v)) => v,
        Ok(None) => return rx.recv().await.ok(),
    };
    while let Ok(Some(v)) = rx.try_recv() {
        msg = v;
    }
    Some(msg)
}

#[instrument(skip_all)]
async fn camera_info_task(
    sub: Subscriber<FifoChannelHandler<Sample>>,
    cell: Arc<IntrinsicsCell>,
) {
    let mut rejected = Throttle::new(WARN_PERIOD);

    while let Ok(sample) = sub.recv_async().await {
        let info: CameraInfo = match cdr::deserialize(&sample.payload().to_bytes()) {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to decode camera info: {:?}", e);
                continue;
            }
        };

        match Intrinsics::from_camera_info(&info) {
            Ok(intrinsics) => {
                if !cell.is_set() {
                    info!(
                        fx = intrinsics.fx,
                        fy = intrinsics.fy,
                        cx = intrinsics.cx,
                        cy = intrinsics.cy,
                        "received camera intrinsics"
                    );
                }
                cell.store(intrinsics);
            }
            Err(e) => {
                if rejected.ready() {
                    warn!("Ignoring camera info: {}", e);
                }
            }
        }
    }
}

#[instrument(skip_all)]
async fn color_task(sub: Subscriber<FifoChannelHandler<Sample>>, latest: LatestImage) {
    let mut unsupported = Throttle::new(WARN_PERIOD);

    while let Ok(sample) = sub.recv_async().await {
        let image: Image = match cdr::deserialize(&sample.payload().to_bytes()) {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to decode color image: {:?}", e);
                continue;
            }
        };

        // Keep the previous image when the new one cannot be sampled.
        if let Err(e) = ColorLayout::from_name(&image.encoding) {
            if unsupported.ready() {
                warn!("Color image has {}", e);
            }
            continue;
        }

        *latest.write().await = Some(image);
    }
}

// Queues a message without waiting, evicting the oldest queued message while
// the channel is full. Returns false once the channel is closed.
fn push_latest<T>(tx: &AsyncSender<T>, rx: &AsyncReceiver<T>, msg: T) -> bool {
    let mut msg = Some(msg);
    loop {
        match tx.try_send_option(&mut msg) {
            Ok(true) => return true,
            Ok(false) => {
                if let Ok(Some(_)) = rx.try_recv() {
                    trace!("dropped stale depth frame");
                }
            }
            Err(_) => return false,
        }
    }
}

#[instrument(skip_all)]
async fn depth_task(
    sub: Subscriber<FifoChannelHandler<Sample>>,
    tx: AsyncSender<Image>,
    rx: AsyncReceiver<Image>,
) {
    while let Ok(sample) = sub.recv_async().await {
        let image: Image = match cdr::deserialize(&sample.payload().to_bytes()) {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to decode depth image: {:?}", e);
                continue;
            }
        };

        if !push_latest(&tx, &rx, image) {
            debug!("depth channel closed");
            return;
        }
    }
}

/// Convert a depth image into an encoded PointCloud2 message.
#[instrument(skip_all, fields(width = depth.width, height = depth.height))]
fn convert_frame(
    depth: &Image,
    intrinsics: Option<Intrinsics>,
    color: Option<&Image>,
    config: &ConvertConfig,
) -> Result<(ZBytes, Encoding), Error> {
    // Frames are dropped until camera info arrives, whatever their encoding.
    let intrinsics = intrinsics.ok_or(Error::NotReady)?;
    let view = DepthImage::from_msg(depth)?;
    let color = color.and_then(|img| ColorImage::from_msg(img).ok());

    let cloud = depth_to_cloud(&view, Some(&intrinsics), color.as_ref(), config)?;
    let msg = to_pointcloud2(&cloud, depth.header.clone());

    let msg = ZBytes::from(cdr::serialize::<_, _, CdrLe>(&msg, Infinite)?);
    let enc = Encoding::APPLICATION_CDR.with_schema("sensor_msgs/msg/PointCloud2");

    Ok((msg, enc))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let stdout_log = tracing_subscriber::fmt::layer().with_filter(args.rust_log);
    let tracy = args
        .tracy
        .then(|| tracing_tracy::TracyLayer::new(tracing_tracy::DefaultConfig::default()));
    tracing_subscriber::registry()
        .with(stdout_log)
        .with(tracy)
        .init();

    let config = args.convert_config();
    config.validate()?;

    let session = zenoh::open(zenoh::Config::try_from(args.clone())?).await?;
    debug!("opened zenoh session");

    let intrinsics = Arc::new(IntrinsicsCell::new());
    let info_sub = session
        .declare_subscriber(args.camera_info_topic.clone())
        .await?;
    tokio::spawn(camera_info_task(info_sub, intrinsics.clone()));

    let latest_color: LatestImage = Arc::new(RwLock::new(None));
    if args.colorful {
        let image_sub = session.declare_subscriber(args.image_topic.clone()).await?;
        tokio::spawn(color_task(image_sub, latest_color.clone()));
    }

    let (tx, rx) = kanal::bounded_async(DEPTH_QUEUE);
    let depth_sub = session.declare_subscriber(args.depth_topic.clone()).await?;
    tokio::spawn(depth_task(depth_sub, tx, rx.clone()));

    let publisher = match session
        .declare_publisher(args.points_topic.clone())
        .priority(Priority::DataHigh)
        .congestion_control(CongestionControl::Drop)
        .await
    {
        Ok(v) => v,
        Err(e) => {
            error!("Failed to create publisher {}: {:?}", args.points_topic, e);
            return Err(e);
        }
    };

    info!(
        depth = %args.depth_topic,
        points = %args.points_topic,
        range_max = config.range_max,
        use_quiet_nan = config.use_quiet_nan,
        decimation = config.decimation,
        colorful = args.colorful,
        "depthcloud running"
    );

    let mut not_ready = Throttle::new(WARN_PERIOD);
    let mut unsupported = Throttle::new(WARN_PERIOD);

    while let Some(depth) = drain_recv(&rx).await {
        let result = {
            let color = latest_color.read().await;
            convert_frame(&depth, intrinsics.load(), color.as_ref(), &config)
        };

        match result {
            Ok((msg, enc)) => match publisher.put(msg).encoding(enc).await {
                Ok(_) => trace!("{} message sent", args.points_topic),
                Err(e) => error!("{} message error: {:?}", args.points_topic, e),
            },
            Err(Error::NotReady) => {
                if not_ready.ready() {
                    warn!("No camera info, skipping point cloud conversion");
                }
            }
            Err(Error::UnsupportedEncoding(encoding)) => {
                if unsupported.ready() {
                    warn!("Depth image has unsupported encoding [{}]", encoding);
                }
            }
            Err(e) => error!("Depth conversion failed: {}", e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle() {
        let mut throttle = Throttle::new(Duration::from_secs(3600));
        assert!(throttle.ready());
        assert!(!throttle.ready());

        let mut throttle = Throttle::new(Duration::ZERO);
        assert!(throttle.ready());
        assert!(throttle.ready());
    }

    #[tokio::test]
    async fn test_drain_recv_returns_latest() {
        let (tx, rx) = kanal::bounded_async(4);
        for i in 0..3 {
            tx.send(i).await.unwrap();
        }
        assert_eq!(drain_recv(&rx).await, Some(2));

        tx.send(7).await.unwrap();
        assert_eq!(drain_recv(&rx).await, Some(7));

        drop(tx);
        assert_eq!(drain_recv(&rx).await, None);
    }

    #[tokio::test]
    async fn test_push_latest_drops_stale_frames() {
        let (tx, rx) = kanal::bounded_async(4);
        for i in 0..10 {
            assert!(push_latest(&tx, &rx, i));
        }
        // The producer never blocks and only the newest frames remain queued
        assert_eq!(rx.len(), 4);
        assert_eq!(rx.try_recv().unwrap(), Some(6));
        assert_eq!(drain_recv(&rx).await, Some(9));
        assert!(rx.is_empty());

        // Only the newest frame reaches the conversion loop
        for i in 10..20 {
            assert!(push_latest(&tx, &rx, i));
        }
        assert_eq!(drain_recv(&rx).await, Some(19));
    }

    #[test]
    fn test_push_latest_closed_channel() {
        let (tx, rx) = kanal::bounded_async::<u32>(4);
        let _ = rx.close();
        assert!(!push_latest(&tx, &rx, 1));
    }
}
