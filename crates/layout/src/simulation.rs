use std::collections::BTreeMap;

use foundation::CameraId;
use foundation::math::{ScreenPoint, Vec2};

use crate::config::LayoutConfig;
use crate::node::{Node, NodeFrame, NodeInput};
use crate::proximity::{camera_scale, proximity_scale};

/// Upper bound on position relaxation passes per tick.
const MAX_CONSTRAINT_PASSES: usize = 64;

/// Deterministic linear congruential generator used to separate coincident
/// nodes.
#[derive(Debug, Clone)]
struct Lcg(u32);

impl Lcg {
    const A: u32 = 1_664_525;
    const C: u32 = 1_013_904_223;

    fn next_unit(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(Self::A).wrapping_add(Self::C);
        f64::from(self.0) / 4_294_967_296.0
    }

    fn jiggle(&mut self) -> f64 {
        (self.next_unit() - 0.5) * 1e-6
    }
}

/// Force-directed declutter layout for camera thumbnails.
///
/// Each node is pulled towards its home (the projected camera location) while
/// collision keeps thumbnails from overlapping. Energy (`alpha`) decays every
/// tick; once it drops below `alpha_min` the layout is settled and ticks return
/// the previous frame unchanged. Node, home and pointer updates reheat it.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: LayoutConfig,
    nodes: Vec<Node>,
    alpha: f64,
    pointer: Option<ScreenPoint>,
    box_px: Vec2,
    jiggle: Lcg,
    ticks: u64,
}

impl Simulation {
    pub fn new(config: LayoutConfig) -> Self {
        let mut sim = Self {
            config,
            nodes: Vec::new(),
            alpha: 1.0,
            pointer: None,
            box_px: Vec2::ZERO,
            jiggle: Lcg(1),
            ticks: 0,
        };
        sim.refresh_box();
        sim
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Replaces the tuning. Radii are recomputed and the layout reheated.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.refresh_box();
        self.update_scales();
        self.reheat();
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn is_idle(&self) -> bool {
        self.alpha < self.config.alpha_min
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn camera_ids(&self) -> impl Iterator<Item = &CameraId> {
        self.nodes.iter().map(|n| &n.camera_id)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Unscaled thumbnail size for the current node count.
    pub fn box_px(&self) -> Vec2 {
        self.box_px
    }

    pub fn pointer(&self) -> Option<ScreenPoint> {
        self.pointer
    }

    /// Replaces the node set.
    ///
    /// Nodes whose id persists keep position and velocity and take the new
    /// home. New ids start at their home at rest. Duplicated ids keep the first
    /// occurrence.
    pub fn sync(&mut self, inputs: &[NodeInput]) {
        let mut previous: BTreeMap<CameraId, Node> = self
            .nodes
            .drain(..)
            .map(|n| (n.camera_id.clone(), n))
            .collect();

        let mut seen = std::collections::HashSet::new();
        for input in inputs {
            if !seen.insert(&input.camera_id) || !input.home.is_finite() {
                continue;
            }
            let node = match previous.remove(&input.camera_id) {
                Some(mut node) => {
                    node.home = input.home;
                    node
                }
                None => Node::at_home(input),
            };
            self.nodes.push(node);
        }

        self.refresh_box();
        self.update_scales();
        self.reheat();
    }

    /// Moves the anchors of known nodes, e.g. after the map panned.
    ///
    /// Ids without a node are ignored. Nodes not listed keep their home.
    pub fn set_homes(&mut self, homes: &BTreeMap<CameraId, ScreenPoint>) {
        for node in &mut self.nodes {
            if let Some(home) = homes.get(&node.camera_id)
                && home.is_finite()
            {
                node.home = *home;
            }
        }
        self.reheat();
    }

    /// Updates the pointer position; `None` when it left the surface.
    pub fn set_pointer(&mut self, pointer: Option<ScreenPoint>) {
        let pointer = pointer.filter(|p| p.is_finite());
        if pointer == self.pointer {
            return;
        }
        self.pointer = pointer;
        if self.config.proximity_enabled {
            self.reheat();
        }
    }

    /// Node closest to the pointer, if within the proximity radius.
    ///
    /// Always `None` while proximity scaling is off.
    pub fn closest_to_pointer(&self) -> Option<&CameraId> {
        if !self.config.proximity_enabled {
            return None;
        }
        let pointer = self.pointer?;
        self.nodes
            .iter()
            .map(|n| (n.pos.distance(pointer), &n.camera_id))
            .filter(|(d, _)| *d < self.config.mouse_proximity_radius)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }

    /// Current positions without advancing the simulation.
    pub fn frames(&self) -> Vec<NodeFrame> {
        self.nodes.iter().map(Node::frame).collect()
    }

    /// Advances one step and returns the resulting frame.
    pub fn tick(&mut self) -> Vec<NodeFrame> {
        if self.is_idle() {
            return self.frames();
        }
        self.ticks += 1;
        self.alpha += (0.0 - self.alpha) * self.config.alpha_decay;

        self.update_scales();
        self.apply_anchor_springs();
        apply_collision(&mut self.nodes, &mut self.jiggle);

        let keep = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            node.vel = node.vel * keep;
            node.pos = node.pos + node.vel;
        }

        relax_overlaps(&mut self.nodes, &mut self.jiggle);
        self.frames()
    }

    fn reheat(&mut self) {
        self.alpha = self.alpha.max(self.config.reheat_alpha);
    }

    fn refresh_box(&mut self) {
        let scale = camera_scale(&self.config, self.nodes.len());
        let [w, h] = self.config.base_box_px;
        self.box_px = Vec2::new(w * scale, h * scale);
    }

    fn update_scales(&mut self) {
        let half_width = self.box_px.x * 0.5;
        for node in &mut self.nodes {
            node.scale = match self.pointer {
                Some(p) if self.config.proximity_enabled => {
                    proximity_scale(&self.config, node.pos.distance(p))
                }
                _ => self.config.min_scale,
            };
            node.radius = half_width * node.scale + self.config.collision_padding;
        }
    }

    fn apply_anchor_springs(&mut self) {
        let kx = self.config.strength_x * self.alpha;
        let ky = self.config.strength_y * self.alpha;
        for node in &mut self.nodes {
            node.vel.x += (node.home.x - node.pos.x) * kx;
            node.vel.y += (node.home.y - node.pos.y) * ky;
        }
    }
}

/// Pairwise collision on predicted positions, applied to velocities.
///
/// The overlap is split so the larger node moves less.
fn apply_collision(nodes: &mut [Node], jiggle: &mut Lcg) {
    for i in 0..nodes.len() {
        let ri = nodes[i].radius;
        for j in (i + 1)..nodes.len() {
            let rj = nodes[j].radius;
            let predicted_i = nodes[i].pos + nodes[i].vel;
            let predicted_j = nodes[j].pos + nodes[j].vel;
            let mut d = predicted_i - predicted_j;
            let r = ri + rj;
            let mut l2 = d.length_squared();
            if l2 >= r * r {
                continue;
            }
            if d.x == 0.0 {
                d.x = jiggle.jiggle();
                l2 += d.x * d.x;
            }
            if d.y == 0.0 {
                d.y = jiggle.jiggle();
                l2 += d.y * d.y;
            }
            let l = l2.sqrt();
            let push = d * ((r - l) / l);
            let wi = split_weight(ri, rj);
            nodes[i].vel = nodes[i].vel + push * wi;
            nodes[j].vel = nodes[j].vel - push * (1.0 - wi);
        }
    }
}

/// Pushes overlapping pairs apart until their centers are `ri + rj` apart.
fn relax_overlaps(nodes: &mut [Node], jiggle: &mut Lcg) {
    for _ in 0..MAX_CONSTRAINT_PASSES {
        let mut moved = false;
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let (ri, rj) = (nodes[i].radius, nodes[j].radius);
                let r = ri + rj;
                let mut d = nodes[i].pos - nodes[j].pos;
                if d.length_squared() >= r * r {
                    continue;
                }
                if d.x == 0.0 && d.y == 0.0 {
                    d = Vec2::new(jiggle.jiggle(), jiggle.jiggle());
                }
                let l = d.length();
                let push = d * ((r - l) / l);
                let wi = split_weight(ri, rj);
                nodes[i].pos = nodes[i].pos + push * wi;
                nodes[j].pos = nodes[j].pos - push * (1.0 - wi);
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
}

/// Share of a separation taken by the first node of a pair.
fn split_weight(ri: f64, rj: f64) -> f64 {
    let (a, b) = (ri * ri, rj * rj);
    if a + b == 0.0 { 0.5 } else { b / (a + b) }
}
