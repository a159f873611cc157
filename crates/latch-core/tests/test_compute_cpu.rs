mod common;

use common::{flat_image, ramp_image, textured_image};
use image::{GrayImage, Luma};
use latch_core::compute::cpu::{latch_descriptor, CpuAccelerator};
use latch_core::compute::{
    create_accelerator, Accelerator, AddressMode, DevicePreference, Extent, FilterMode,
    ResourceDesc, ResourceKind,
};
use latch_core::consts::DESCRIPTOR_BYTES;
use latch_core::descriptor::Descriptor;
use latch_core::error::LatchError;
use latch_core::keypoint::KernelKeypoint;
use latch_core::table::{pack_point, ConstantTable};

fn kkp(x: f32, y: f32, angle: f32) -> KernelKeypoint {
    KernelKeypoint {
        x,
        y,
        scale: 31.0,
        angle,
    }
}

// ---------------------------------------------------------------------------
// Provisioning
// ---------------------------------------------------------------------------

#[test]
fn test_upload_table_linear_clamped() {
    let accel = CpuAccelerator::new();
    let table = ConstantTable::latch();
    let res = accel
        .upload_table(&table, ResourceDesc::linear_table())
        .unwrap();
    assert_eq!(res.kind(), ResourceKind::TripletTable);
    assert_eq!(res.extent(), Extent::Linear(512));

    let view = res.host_view().unwrap();
    assert_eq!(view.fetch_1d(0), table.entries()[0]);
    assert_eq!(view.fetch_1d(511), table.entries()[511]);
    // Clamped addressing: out-of-range indices return the edge entries.
    assert_eq!(view.fetch_1d(-4), table.entries()[0]);
    assert_eq!(view.fetch_1d(9999), table.entries()[511]);
}

#[test]
fn test_upload_image_planar_clamped() {
    let accel = CpuAccelerator::new();
    let image = GrayImage::from_fn(8, 4, |x, y| Luma([(y * 8 + x) as u8]));
    let res = accel
        .upload_image(&image, ResourceDesc::planar_image())
        .unwrap();
    assert_eq!(
        res.extent(),
        Extent::Planar {
            width: 8,
            height: 4
        }
    );
    assert_eq!(res.extent().len(), 32);

    let view = res.host_view().unwrap();
    assert_eq!(view.fetch_2d(3, 2), 19);
    assert_eq!(view.fetch_2d(-1, -1), 0);
    assert_eq!(view.fetch_2d(100, 0), 7);
    assert_eq!(view.fetch_2d(100, 100), 31);
    assert_eq!(view.fetch_2d(0, 100), 24);
}

#[test]
fn test_border_addressing_reads_zero() {
    let accel = CpuAccelerator::new();
    let image = flat_image(4, 4, 200);
    let desc = ResourceDesc {
        address: [AddressMode::Border, AddressMode::Border],
        filter: FilterMode::Point,
    };
    let res = accel.upload_image(&image, desc).unwrap();
    let view = res.host_view().unwrap();
    assert_eq!(view.fetch_2d(1, 1), 200);
    assert_eq!(view.fetch_2d(-1, 1), 0);
    assert_eq!(view.fetch_2d(1, 4), 0);
}

#[test]
fn test_linear_filtering_rejected() {
    let accel = CpuAccelerator::new();
    let desc = ResourceDesc {
        filter: FilterMode::Linear,
        ..ResourceDesc::linear_table()
    };
    let err = accel
        .upload_table(&ConstantTable::latch(), desc)
        .err()
        .unwrap();
    assert!(matches!(
        err,
        LatchError::Binding {
            resource: ResourceKind::TripletTable,
            ..
        }
    ));
}

#[test]
fn test_empty_image_rejected() {
    let accel = CpuAccelerator::new();
    let err = accel
        .upload_image(&GrayImage::new(0, 0), ResourceDesc::planar_image())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        LatchError::Provision {
            resource: ResourceKind::Image,
            ..
        }
    ));
}

#[test]
fn test_upload_image_with_oversized_container() {
    let (width, height) = (64u32, 64u32);
    let expected = (width * height) as usize;
    let mut raw: Vec<u8> = (0..expected).map(|i| (i % 251) as u8).collect();
    raw.extend_from_slice(&[255; 16]);
    let image = GrayImage::from_raw(width, height, raw).unwrap();
    assert_eq!(image.as_raw().len(), expected + 16);

    let accel = CpuAccelerator::new();
    let res = accel
        .upload_image(&image, ResourceDesc::planar_image())
        .unwrap();
    assert_eq!(
        res.extent(),
        Extent::Planar {
            width: 64,
            height: 64
        }
    );
    let view = res.host_view().unwrap();
    assert_eq!(view.fetch_2d(0, 0), 0);
    assert_eq!(view.fetch_2d(63, 63), ((expected - 1) % 251) as u8);
    // Clamped reads never reach the trailing bytes.
    assert_eq!(view.fetch_2d(200, 200), ((expected - 1) % 251) as u8);
}

#[test]
fn test_descriptor_buffer_sizing() {
    let accel = CpuAccelerator::new();
    for count in [1usize, 7, 5000] {
        let buf = accel.alloc_descriptors(count).unwrap();
        assert_eq!(buf.len(), count);
        assert_eq!(buf.byte_len(), DESCRIPTOR_BYTES * count);
        assert_eq!(buf.byte_len(), 64 * count);
    }
}

#[test]
fn test_cpu_preference_creates_cpu() {
    let accel = create_accelerator(&DevicePreference::Cpu).unwrap();
    assert_eq!(accel.name(), "CPU/Rayon");
    assert!(!accel.is_gpu());
    assert!(accel.take_last_error().is_none());
}

// ---------------------------------------------------------------------------
// Kernel
// ---------------------------------------------------------------------------

#[test]
fn test_kernel_rejects_count_beyond_buffers() {
    let accel = CpuAccelerator::new();
    let image = accel
        .upload_image(&textured_image(128, 128), ResourceDesc::planar_image())
        .unwrap();
    let table = accel
        .upload_table(&ConstantTable::latch(), ResourceDesc::linear_table())
        .unwrap();
    let kps = accel.upload_keypoints(&[kkp(64.0, 64.0, 0.0)]).unwrap();
    let mut out = accel.alloc_descriptors(1).unwrap();
    let kernel = accel.descriptor_kernel().unwrap();

    let err = kernel
        .compute_descriptors(&image, &table, &kps, 2, &mut out)
        .unwrap_err();
    assert!(matches!(err, LatchError::Launch(_)));
}

#[test]
fn test_kernel_fills_output_and_overwrites() {
    let accel = CpuAccelerator::new();
    let img = textured_image(200, 200);
    let image = accel
        .upload_image(&img, ResourceDesc::planar_image())
        .unwrap();
    let table = accel
        .upload_table(&ConstantTable::latch(), ResourceDesc::linear_table())
        .unwrap();
    let points = [kkp(60.0, 60.0, 0.0), kkp(100.0, 120.0, 1.0), kkp(150.0, 90.0, 4.0)];
    let kps = accel.upload_keypoints(&points).unwrap();
    let mut out = accel.alloc_descriptors(points.len()).unwrap();
    let kernel = accel.descriptor_kernel().unwrap();

    kernel
        .compute_descriptors(&image, &table, &kps, points.len(), &mut out)
        .unwrap();
    let first = accel.download_descriptors(&out).unwrap();
    kernel
        .compute_descriptors(&image, &table, &kps, points.len(), &mut out)
        .unwrap();
    let second = accel.download_descriptors(&out).unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert!(first.iter().all(|d| *d != Descriptor::default()));
}

#[test]
fn test_flat_image_gives_zero_descriptor() {
    let accel = CpuAccelerator::new();
    let image = accel
        .upload_image(&flat_image(100, 100, 77), ResourceDesc::planar_image())
        .unwrap();
    let table = accel
        .upload_table(&ConstantTable::latch(), ResourceDesc::linear_table())
        .unwrap();
    let desc = latch_descriptor(
        &image.host_view().unwrap(),
        &table.host_view().unwrap(),
        &kkp(50.0, 50.0, 0.3),
    );
    assert_eq!(desc, Descriptor::default());
}

#[test]
fn test_synthetic_triplet_sets_expected_bit() {
    // On a ramp, a patch one column right of the anchor is closer than one
    // ten columns right, so ssd(anchor, far) > ssd(anchor, near).
    let accel = CpuAccelerator::new();
    let image = accel
        .upload_image(&ramp_image(128, 128), ResourceDesc::planar_image())
        .unwrap();
    let set = [pack_point(8, 16), pack_point(20, 16), pack_point(9, 16), 0];
    let clear = [pack_point(8, 16), pack_point(9, 16), pack_point(20, 16), 0];
    let entries: Vec<_> = (0..512).map(|i| if i % 2 == 0 { set } else { clear }).collect();
    let table = ConstantTable::new("ramp-test", entries).unwrap();
    let table = accel
        .upload_table(&table, ResourceDesc::linear_table())
        .unwrap();

    let desc = latch_descriptor(
        &image.host_view().unwrap(),
        &table.host_view().unwrap(),
        &kkp(64.0, 64.0, 0.0),
    );
    for bit in 0..512 {
        assert_eq!(desc.bit(bit), bit % 2 == 0, "bit {bit}");
    }
}

#[test]
fn test_short_table_clamps_to_last_entry() {
    let accel = CpuAccelerator::new();
    let image = accel
        .upload_image(&ramp_image(128, 128), ResourceDesc::planar_image())
        .unwrap();
    let set = [pack_point(8, 16), pack_point(20, 16), pack_point(9, 16), 0];
    let table = ConstantTable::new("one", vec![set]).unwrap();
    let table = accel
        .upload_table(&table, ResourceDesc::linear_table())
        .unwrap();
    let desc = latch_descriptor(
        &image.host_view().unwrap(),
        &table.host_view().unwrap(),
        &kkp(64.0, 64.0, 0.0),
    );
    assert_eq!(desc.count_ones(), 512);
}
