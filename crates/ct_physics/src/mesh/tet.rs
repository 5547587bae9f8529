// crates/ct_physics/src/mesh/tet.rs

//! 四面体网格
//!
//! 最小的非结构网格实现，只提供本层需要的几何查询：
//! - 面外法向（局部面 i 为顶点 i 的对面）
//! - 单元直径与顶点特征长度
//! - 边界面枚举
//!
//! 网格生成与分区由外部引擎负责；[`TetMesh::box_mesh`] 仅用于演示和测试。

use std::collections::HashMap;

use ct_foundation::{CellIndex, CtError, CtResult};
use glam::DVec3;

use super::geometry::{FacetContext, FacetGeometry};
use super::length_scale::VertexLengthScale;

/// 局部面 i 对应的三个顶点（局部编号）
const FACET_VERTICES: [[usize; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];

/// 四面体网格
#[derive(Debug, Clone)]
pub struct TetMesh {
    vertices: Vec<DVec3>,
    cells: Vec<[usize; 4]>,
}

impl TetMesh {
    /// 从顶点坐标和单元连接关系创建
    pub fn from_raw(vertices: Vec<DVec3>, cells: Vec<[usize; 4]>) -> CtResult<Self> {
        let n_vertices = vertices.len();
        for (c, conn) in cells.iter().enumerate() {
            if let Some(&v) = conn.iter().find(|&&v| v >= n_vertices) {
                return Err(CtError::invalid_mesh(format!(
                    "单元 {} 引用了不存在的顶点 {} (顶点数 {})",
                    c, v, n_vertices
                )));
            }
            let [a, b, cc, d] = conn.map(|v| vertices[v]);
            let volume = (b - a).cross(cc - a).dot(d - a).abs() / 6.0;
            if volume <= f64::EPSILON * (b - a).length().powi(3) {
                return Err(CtError::invalid_mesh(format!("单元 {} 体积退化", c)));
            }
        }
        Ok(Self { vertices, cells })
    }

    /// 生成长方体网格：每个六面体按 Kuhn 剖分拆成 6 个四面体
    pub fn box_mesh(divisions: [usize; 3], extent: DVec3) -> CtResult<Self> {
        let [nx, ny, nz] = divisions;
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(CtError::invalid_mesh("每个方向至少需要一个剖分"));
        }
        if !(extent.x > 0.0 && extent.y > 0.0 && extent.z > 0.0) {
            return Err(CtError::invalid_mesh(format!("长方体尺寸必须为正: {:?}", extent)));
        }

        let id = |i: usize, j: usize, k: usize| (k * (ny + 1) + j) * (nx + 1) + i;
        let step = extent / DVec3::new(nx as f64, ny as f64, nz as f64);

        let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
        for k in 0..=nz {
            for j in 0..=ny {
                for i in 0..=nx {
                    vertices.push(DVec3::new(i as f64, j as f64, k as f64) * step);
                }
            }
        }

        // 沿主对角线 000 -> 111 的 6 条单调路径
        const PATHS: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        let mut cells = Vec::with_capacity(6 * nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    for path in PATHS {
                        let mut pos = [i, j, k];
                        let mut tet = [id(i, j, k); 4];
                        for (s, axis) in path.iter().enumerate() {
                            pos[*axis] += 1;
                            tet[s + 1] = id(pos[0], pos[1], pos[2]);
                        }
                        cells.push(tet);
                    }
                }
            }
        }

        Self::from_raw(vertices, cells)
    }

    /// 顶点数
    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// 顶点坐标
    #[inline]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// 单元的四个顶点编号
    pub fn cell_vertices(&self, cell: CellIndex) -> CtResult<[usize; 4]> {
        self.cells.get(cell.get()).copied().ok_or_else(|| {
            CtError::invalid_mesh(format!("单元索引 {} 超出范围 0..{}", cell, self.cells.len()))
        })
    }

    /// 单元直径（最长边长）
    pub fn cell_diameter(&self, cell: CellIndex) -> CtResult<f64> {
        let conn = self.cell_vertices(cell)?;
        let mut diameter: f64 = 0.0;
        for a in 0..4 {
            for b in (a + 1)..4 {
                diameter = diameter.max(self.vertices[conn[a]].distance(self.vertices[conn[b]]));
            }
        }
        Ok(diameter)
    }

    /// 顶点特征长度：相邻单元直径的最小值
    pub fn vertex_length_scale(&self) -> CtResult<VertexLengthScale> {
        let mut h = vec![f64::INFINITY; self.vertices.len()];
        for c in 0..self.cells.len() {
            let diameter = self.cell_diameter(CellIndex::new(c))?;
            for &v in &self.cells[c] {
                h[v] = h[v].min(diameter);
            }
        }
        if let Some(orphan) = h.iter().position(|v| v.is_infinite()) {
            return Err(CtError::invalid_mesh(format!("顶点 {} 不属于任何单元", orphan)));
        }
        VertexLengthScale::new(h)
    }

    /// 面中心
    pub fn facet_midpoint(&self, facet: FacetContext) -> CtResult<DVec3> {
        let local = self.checked_local_facet(facet)?;
        let conn = self.cell_vertices(facet.cell)?;
        let sum = FACET_VERTICES[local]
            .iter()
            .fold(DVec3::ZERO, |acc, &v| acc + self.vertices[conn[v]]);
        Ok(sum / 3.0)
    }

    /// 枚举所有边界面（只属于一个单元的面），按 (单元, 局部面) 排序
    pub fn boundary_facets(&self) -> Vec<FacetContext> {
        let mut owners: HashMap<[usize; 3], (usize, usize)> = HashMap::new();
        let mut counts: HashMap<[usize; 3], usize> = HashMap::new();
        for (c, conn) in self.cells.iter().enumerate() {
            for (local, fv) in FACET_VERTICES.iter().enumerate() {
                let mut key = fv.map(|v| conn[v]);
                key.sort_unstable();
                owners.entry(key).or_insert((c, local));
                *counts.entry(key).or_insert(0) += 1;
            }
        }

        let mut facets: Vec<FacetContext> = counts
            .into_iter()
            .filter(|(_, n)| *n == 1)
            .filter_map(|(key, _)| owners.get(&key))
            .map(|&(c, local)| FacetContext::new(CellIndex::new(c), local as i32))
            .collect();
        facets.sort_unstable();
        facets
    }

    fn checked_local_facet(&self, facet: FacetContext) -> CtResult<usize> {
        let local = facet.boundary_facet()?;
        if local >= 4 || facet.cell.get() >= self.cells.len() {
            return Err(CtError::InvalidFacet {
                cell: facet.cell.get(),
                local_facet: facet.local_facet,
            });
        }
        Ok(local)
    }
}

impl FacetGeometry for TetMesh {
    fn n_cells(&self) -> usize {
        self.cells.len()
    }

    fn facet_normal(&self, facet: FacetContext) -> CtResult<DVec3> {
        let local = self.checked_local_facet(facet)?;
        let conn = self.cells[facet.cell.get()];
        let [a, b, c] = FACET_VERTICES[local].map(|v| self.vertices[conn[v]]);
        let opposite = self.vertices[conn[local]];

        let n = (b - a).cross(c - a);
        let n = n.try_normalize().ok_or_else(|| {
            CtError::invalid_mesh(format!("单元 {} 的局部面 {} 面积退化", facet.cell, local))
        })?;
        // 朝向远离单元内部
        if n.dot(opposite - a) > 0.0 {
            Ok(-n)
        } else {
            Ok(n)
        }
    }
}
