use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tracerflow::{
    CartesianGrid, CsrMatrix, GridTopology, KspContext, SerialComm, SolverOptions, allocate_matrix, build_sparsity,
};

/// Upwind-like transport matrix: unit outflow to every face neighbour.
fn transport_matrix(grid: &CartesianGrid) -> CsrMatrix<f64> {
    let mut a = allocate_matrix::<f64>(&build_sparsity(grid)).unwrap();
    for i in 0..a.nrows() {
        let cols: Vec<usize> = a.row(i).0.to_vec();
        for (k, &j) in cols.iter().enumerate().filter(|(_, j)| **j != i) {
            *a.entry_mut(i, j).unwrap() = -0.5 - 0.1 * ((i + k) % 3) as f64;
        }
        *a.entry_mut(i, i).unwrap() = 1.0 + cols.len() as f64;
    }
    a
}

fn bench_batch_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_solve");
    for &nx in &[10usize, 20, 40] {
        let grid = CartesianGrid::new([nx, nx, 4], [50.0, 50.0, 5.0]).unwrap();
        let a = transport_matrix(&grid);
        let n = grid.num_cells();
        let bs: Vec<Vec<f64>> = (0..4)
            .map(|t| (0..n).map(|i| ((i + t) as f64).sin()).collect())
            .collect();
        let mut xs = vec![vec![0.0; n]; bs.len()];
        let ctx = KspContext::new(SolverOptions::default(), &SerialComm, &grid);

        group.bench_with_input(BenchmarkId::new("ilu0_bicgstab", n), &n, |ben, _| {
            ben.iter(|| {
                let outcome = ctx.solve_batch(black_box(&a), black_box(&mut xs), black_box(&bs)).unwrap();
                black_box(outcome.converged())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_batch_solve);
criterion_main!(benches);
