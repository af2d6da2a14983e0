use std::{arch::x86_64::*, sync::{OnceLock, atomic::{compiler_fence, Ordering}}};
use skein::{Skein512, Skein512Backend, Skein512Core, Digest as _, digest::core_api::CoreWrapper};

#[inline(always)]
fn square<T: std::ops::Mul<T> + Copy>(x: T) -> <T as std::ops::Mul<T>>::Output {
    x*x
}

fn profile(label: &str, gen: Skein512) {
    static DATA: OnceLock<Vec<u8>> = OnceLock::new();
    static HASH: OnceLock<Vec<u8>> = OnceLock::new();

    let data = DATA.get_or_init(|| vec![11; 256*1024*1024]);
    let mut cpb = Vec::new();

    for _ in 0..20 {
        compiler_fence(Ordering::SeqCst);
        unsafe { __cpuid(0) };
        compiler_fence(Ordering::SeqCst);
        let t0 = unsafe { _rdtsc() };
        compiler_fence(Ordering::SeqCst);
        let mut h = gen.clone();
        h.update(data);
        let hash = h.finalize();
        compiler_fence(Ordering::SeqCst);
        let t1 = unsafe { __rdtscp(&mut 0) };
        compiler_fence(Ordering::SeqCst);
        unsafe { __cpuid(0) };
        compiler_fence(Ordering::SeqCst);
        let b = HASH.get_or_init(|| hash.to_vec());
        assert_eq!(&b[..], &hash[..]);
        cpb.push((t1-t0) as f32 / data.len() as f32);
    }

    let mean = cpb.iter().copied().sum::<f32>() / cpb.len() as f32;
    let stdev = (cpb.iter().map(|&z| square(z-mean)).sum::<f32>() / cpb.len() as f32).sqrt();

    println!("{label}: mean = {mean}, stdev = {stdev}");
}

fn main() {
    profile("soft", CoreWrapper::from_core(Skein512Core::new_with_backend(Skein512Backend::Soft).unwrap()));
    profile("avx2", CoreWrapper::from_core(Skein512Core::new_with_backend(Skein512Backend::Avx2).unwrap()));
}
