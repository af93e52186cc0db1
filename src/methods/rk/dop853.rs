//! DOP853 - Dormand–Prince 8(5,3) explicit Runge–Kutta formula
//!
//! Reference
//! - E. Hairer, S. P. Nørsett, and G. Wanner, "Solving Ordinary Differential
//!   Equations I. Nonstiff Problems", 2nd ed., Springer (1993).

use super::RungeKuttaFormula;
use crate::{
    Float,
    core::{
        interpolate::DenseModel,
        ode::{Evaluator, ODE},
    },
    error::Result,
    methods::{controller::ControllerDefaults, settings::Settings},
};

/// Dormand–Prince 8(5,3): twelve stages for an eighth order solution, a
/// combined fifth and third order error estimate and three extra stages for
/// the seventh order continuous extension.
///
/// Stage `K_j` lives in `k[j - 1]`.
#[derive(Clone, Debug)]
pub struct Dop853 {
    k: Vec<Vec<Float>>,
    stage: Vec<Float>,
}

impl RungeKuttaFormula for Dop853 {
    const NAME: &'static str = "DOP853";
    const ORDER: usize = 8;
    const EMBEDDED: bool = true;
    const DEFAULTS: ControllerDefaults = ControllerDefaults {
        safety_factor: 0.9,
        min_reduction: 0.333,
        max_growth: 6.0,
        beta: 0.0,
        beta_weight: 0.2,
    };

    fn new(n: usize) -> Self {
        Self {
            k: vec![vec![0.0; n]; 16],
            stage: vec![0.0; n],
        }
    }

    fn attempt<F>(
        &mut self,
        ev: &mut Evaluator<'_, F>,
        t: Float,
        y: &[Float],
        f0: &[Float],
        h: Float,
        y1: &mut [Float],
        settings: &Settings,
    ) -> Result<Float>
    where
        F: ODE + ?Sized,
    {
        let n = y.len();
        let Self { k, stage } = self;
        k[0].copy_from_slice(f0);

        // Stage 2
        for i in 0..n {
            stage[i] = y[i] + h * A21 * k[0][i];
        }
        ev.call(t + C2 * h, stage, &mut k[1])?;

        // Stage 3
        for i in 0..n {
            stage[i] = y[i] + h * (A31 * k[0][i] + A32 * k[1][i]);
        }
        ev.call(t + C3 * h, stage, &mut k[2])?;

        // Stage 4
        for i in 0..n {
            stage[i] = y[i] + h * (A41 * k[0][i] + A43 * k[2][i]);
        }
        ev.call(t + C4 * h, stage, &mut k[3])?;

        // Stage 5
        for i in 0..n {
            stage[i] = y[i] + h * (A51 * k[0][i] + A53 * k[2][i] + A54 * k[3][i]);
        }
        ev.call(t + C5 * h, stage, &mut k[4])?;

        // Stage 6
        for i in 0..n {
            stage[i] = y[i] + h * (A61 * k[0][i] + A64 * k[3][i] + A65 * k[4][i]);
        }
        ev.call(t + C6 * h, stage, &mut k[5])?;

        // Stage 7
        for i in 0..n {
            stage[i] = y[i] + h * (A71 * k[0][i] + A74 * k[3][i] + A75 * k[4][i] + A76 * k[5][i]);
        }
        ev.call(t + C7 * h, stage, &mut k[6])?;

        // Stage 8
        for i in 0..n {
            stage[i] = y[i]
                + h * (A81 * k[0][i]
                    + A84 * k[3][i]
                    + A85 * k[4][i]
                    + A86 * k[5][i]
                    + A87 * k[6][i]);
        }
        ev.call(t + C8 * h, stage, &mut k[7])?;

        // Stage 9
        for i in 0..n {
            stage[i] = y[i]
                + h * (A91 * k[0][i]
                    + A94 * k[3][i]
                    + A95 * k[4][i]
                    + A96 * k[5][i]
                    + A97 * k[6][i]
                    + A98 * k[7][i]);
        }
        ev.call(t + C9 * h, stage, &mut k[8])?;

        // Stage 10
        for i in 0..n {
            stage[i] = y[i]
                + h * (A101 * k[0][i]
                    + A104 * k[3][i]
                    + A105 * k[4][i]
                    + A106 * k[5][i]
                    + A107 * k[6][i]
                    + A108 * k[7][i]
                    + A109 * k[8][i]);
        }
        ev.call(t + C10 * h, stage, &mut k[9])?;

        // Stage 11
        for i in 0..n {
            stage[i] = y[i]
                + h * (A111 * k[0][i]
                    + A114 * k[3][i]
                    + A115 * k[4][i]
                    + A116 * k[5][i]
                    + A117 * k[6][i]
                    + A118 * k[7][i]
                    + A119 * k[8][i]
                    + A1110 * k[9][i]);
        }
        ev.call(t + C11 * h, stage, &mut k[10])?;

        // Stage 12
        for i in 0..n {
            stage[i] = y[i]
                + h * (A121 * k[0][i]
                    + A124 * k[3][i]
                    + A125 * k[4][i]
                    + A126 * k[5][i]
                    + A127 * k[6][i]
                    + A128 * k[7][i]
                    + A129 * k[8][i]
                    + A1210 * k[9][i]
                    + A1211 * k[10][i]);
        }
        ev.call(t + h, stage, &mut k[11])?;

        // Solution and the two error estimates
        let mut err: Float = 0.0;
        let mut err2: Float = 0.0;
        for i in 0..n {
            let bsum = B1 * k[0][i]
                + B6 * k[5][i]
                + B7 * k[6][i]
                + B8 * k[7][i]
                + B9 * k[8][i]
                + B10 * k[9][i]
                + B11 * k[10][i]
                + B12 * k[11][i];
            y1[i] = y[i] + h * bsum;

            let sk = settings.atol[i] + settings.rtol[i] * y[i].abs().max(y1[i].abs());
            let erri = bsum - BH1 * k[0][i] - BH2 * k[8][i] - BH3 * k[11][i];
            err2 += (erri / sk).powi(2);
            let erri = ER1 * k[0][i]
                + ER6 * k[5][i]
                + ER7 * k[6][i]
                + ER8 * k[7][i]
                + ER9 * k[8][i]
                + ER10 * k[9][i]
                + ER11 * k[10][i]
                + ER12 * k[11][i];
            err += (erri / sk).powi(2);
        }
        let mut deno = err + 0.01 * err2;
        if deno <= 0.0 {
            deno = 1.0;
        }
        Ok(h.abs() * err * (1.0 / (n as Float * deno)).sqrt())
    }

    fn complete<F>(
        &mut self,
        ev: &mut Evaluator<'_, F>,
        t: Float,
        y: &[Float],
        _f0: &[Float],
        h: Float,
        y1: &[Float],
        f1: &mut [Float],
        cont: Option<Vec<Float>>,
    ) -> Result<DenseModel>
    where
        F: ODE + ?Sized,
    {
        let n = y.len();
        let Self { k, stage } = self;
        ev.call(t + h, y1, &mut k[12])?;
        f1.copy_from_slice(&k[12]);

        let Some(mut cont) = cont else {
            return Ok(DenseModel::Linear);
        };
        cont.resize(8 * n, 0.0);

        for i in 0..n {
            cont[i] = y[i];
            let ydiff = y1[i] - y[i];
            cont[n + i] = ydiff;
            let bspl = h * k[0][i] - ydiff;
            cont[2 * n + i] = bspl;
            cont[3 * n + i] = ydiff - h * k[12][i] - bspl;
            cont[4 * n + i] = D41 * k[0][i]
                + D46 * k[5][i]
                + D47 * k[6][i]
                + D48 * k[7][i]
                + D49 * k[8][i]
                + D410 * k[9][i]
                + D411 * k[10][i]
                + D412 * k[11][i];
            cont[5 * n + i] = D51 * k[0][i]
                + D56 * k[5][i]
                + D57 * k[6][i]
                + D58 * k[7][i]
                + D59 * k[8][i]
                + D510 * k[9][i]
                + D511 * k[10][i]
                + D512 * k[11][i];
            cont[6 * n + i] = D61 * k[0][i]
                + D66 * k[5][i]
                + D67 * k[6][i]
                + D68 * k[7][i]
                + D69 * k[8][i]
                + D610 * k[9][i]
                + D611 * k[10][i]
                + D612 * k[11][i];
            cont[7 * n + i] = D71 * k[0][i]
                + D76 * k[5][i]
                + D77 * k[6][i]
                + D78 * k[7][i]
                + D79 * k[8][i]
                + D710 * k[9][i]
                + D711 * k[10][i]
                + D712 * k[11][i];
        }

        // Next three function evaluations
        for i in 0..n {
            stage[i] = y[i]
                + h * (A141 * k[0][i]
                    + A147 * k[6][i]
                    + A148 * k[7][i]
                    + A149 * k[8][i]
                    + A1410 * k[9][i]
                    + A1411 * k[10][i]
                    + A1412 * k[11][i]
                    + A1413 * k[12][i]);
        }
        ev.call(t + C14 * h, stage, &mut k[13])?;

        for i in 0..n {
            stage[i] = y[i]
                + h * (A151 * k[0][i]
                    + A156 * k[5][i]
                    + A157 * k[6][i]
                    + A158 * k[7][i]
                    + A1511 * k[10][i]
                    + A1512 * k[11][i]
                    + A1513 * k[12][i]
                    + A1514 * k[13][i]);
        }
        ev.call(t + C15 * h, stage, &mut k[14])?;

        for i in 0..n {
            stage[i] = y[i]
                + h * (A161 * k[0][i]
                    + A166 * k[5][i]
                    + A167 * k[6][i]
                    + A168 * k[7][i]
                    + A169 * k[8][i]
                    + A1613 * k[12][i]
                    + A1614 * k[13][i]
                    + A1615 * k[14][i]);
        }
        ev.call(t + C16 * h, stage, &mut k[15])?;

        // Final preparation
        for i in 0..n {
            cont[4 * n + i] = h
                * (cont[4 * n + i]
                    + D413 * k[12][i]
                    + D414 * k[13][i]
                    + D415 * k[14][i]
                    + D416 * k[15][i]);
            cont[5 * n + i] = h
                * (cont[5 * n + i]
                    + D513 * k[12][i]
                    + D514 * k[13][i]
                    + D515 * k[14][i]
                    + D516 * k[15][i]);
            cont[6 * n + i] = h
                * (cont[6 * n + i]
                    + D613 * k[12][i]
                    + D614 * k[13][i]
                    + D615 * k[14][i]
                    + D616 * k[15][i]);
            cont[7 * n + i] = h
                * (cont[7 * n + i]
                    + D713 * k[12][i]
                    + D714 * k[13][i]
                    + D715 * k[14][i]
                    + D716 * k[15][i]);
        }

        Ok(DenseModel::DormandPrince {
            t_start: t,
            h,
            rows: 8,
            cont,
        })
    }
}

// DOP853 Butcher tableau coefficients
const C2: Float = 0.526001519587677318785587544488e-01;
const C3: Float = 0.789002279381515978178381316732e-01;
const C4: Float = 0.118350341907227396726757197510e+00;
const C5: Float = 0.281649658092772603273242802490e+00;
const C6: Float = 0.333333333333333333333333333333e+00;
const C7: Float = 0.25e+00;
const C8: Float = 0.307692307692307692307692307692e+00;
const C9: Float = 0.651282051282051282051282051282e+00;
const C10: Float = 0.6e+00;
const C11: Float = 0.857142857142857142857142857142e+00;
const C14: Float = 0.1e+00;
const C15: Float = 0.2e+00;
const C16: Float = 7.777_777_777_777_778e-1;

const A21: Float = 5.26001519587677318785587544488e-2;

const A31: Float = 1.97250569845378994544595329183e-2;
const A32: Float = 5.91751709536136983633785987549e-2;

const A41: Float = 2.95875854768068491816892993775e-2;
const A43: Float = 8.87627564304205475450678981324e-2;

const A51: Float = 2.41365134159266685502369798665e-1;
const A53: Float = -8.84549479328286085344864962717e-1;
const A54: Float = 9.24834003261792003115737966543e-1;

const A61: Float = 3.7037037037037037037037037037e-2;
const A64: Float = 1.70828608729473871279604482173e-1;
const A65: Float = 1.25467687566822425016691814123e-1;

const A71: Float = 3.7109375e-2;
const A74: Float = 1.70252211019544039314978060272e-1;
const A75: Float = 6.02165389804559606850219397283e-2;
const A76: Float = -1.7578125e-2;

const A81: Float = 3.70920001185047927108779319836e-2;
const A84: Float = 1.70383925712239993810214054705e-1;
const A85: Float = 1.07262030446373284651809199168e-1;
const A86: Float = -1.53194377486244017527936158236e-2;
const A87: Float = 8.27378916381402288758473766002e-3;

const A91: Float = 6.24110958716075717114429577812e-1;
const A94: Float = -3.36089262944694129406857109825e0;
const A95: Float = -8.68219346841726006818189891453e-1;
const A96: Float = 2.75920996994467083049415600797e1;
const A97: Float = 2.01540675504778934086186788979e1;
const A98: Float = -4.34898841810699588477366255144e1;

const A101: Float = 4.77662536438264365890433908527e-1;
const A104: Float = -2.48811461997166764192642586468e0;
const A105: Float = -5.90290826836842996371446475743e-1;
const A106: Float = 2.12300514481811942347288949897e1;
const A107: Float = 1.52792336328824235832596922938e1;
const A108: Float = -3.32882109689848629194453265587e1;
const A109: Float = -2.03312017085086261358222928593e-2;

const A111: Float = -9.3714243008598732571704021658e-1;
const A114: Float = 5.18637242884406370830023853209e0;
const A115: Float = 1.09143734899672957818500254654e0;
const A116: Float = -8.14978701074692612513997267357e0;
const A117: Float = -1.85200656599969598641566180701e1;
const A118: Float = 2.27394870993505042818970056734e1;
const A119: Float = 2.49360555267965238987089396762e0;
const A1110: Float = -3.0467644718982195003823669022e0;

const A121: Float = 2.27331014751653820792359768449e0;
const A124: Float = -1.05344954667372501984066689879e1;
const A125: Float = -2.00087205822486249909675718444e0;
const A126: Float = -1.79589318631187989172765950534e1;
const A127: Float = 2.79488845294199600508499808837e1;
const A128: Float = -2.85899827713502369474065508674e0;
const A129: Float = -8.87285693353062954433549289258e0;
const A1210: Float = 1.23605671757943030647266201528e1;
const A1211: Float = 6.43392746015763530355970484046e-1;

const B1: Float = 5.42937341165687622380535766363e-2;
const B6: Float = 4.45031289275240888144113950566e0;
const B7: Float = 1.89151789931450038304281599044e0;
const B8: Float = -5.8012039600105847814672114227e0;
const B9: Float = 3.1116436695781989440891606237e-1;
const B10: Float = -1.52160949662516078556178806805e-1;
const B11: Float = 2.01365400804030348374776537501e-1;
const B12: Float = 4.47106157277725905176885569043e-2;

const BH1: Float = 0.244094488188976377952755905512e+00;
const BH2: Float = 0.733846688281611857341361741547e+00;
const BH3: Float = 0.220588235294117647058823529412e-01;

const ER1: Float = 0.1312004499419488073250102996e-01;
const ER6: Float = -0.1225156446376204440720569753e+01;
const ER7: Float = -0.4957589496572501915214079952e+00;
const ER8: Float = 0.1664377182454986536961530415e+01;
const ER9: Float = -0.3503288487499736816886487290e+00;
const ER10: Float = 0.3341791187130174790297318841e+00;
const ER11: Float = 0.8192320648511571246570742613e-01;
const ER12: Float = -0.2235530786388629525884427845e-01;

const A141: Float = 5.61675022830479523392909219681e-2;
const A147: Float = 2.53500210216624811088794765333e-1;
const A148: Float = -2.46239037470802489917441475441e-1;
const A149: Float = -1.24191423263816360469010140626e-1;
const A1410: Float = 1.5329179827876569731206322685e-1;
const A1411: Float = 8.20105229563468988491666602057e-3;
const A1412: Float = 7.56789766054569976138603589584e-3;
const A1413: Float = -8.298e-3;

const A151: Float = 3.18346481635021405060768473261e-2;
const A156: Float = 2.83009096723667755288322961402e-2;
const A157: Float = 5.35419883074385676223797384372e-2;
const A158: Float = -5.49237485713909884646569340306e-2;
const A1511: Float = -1.08347328697249322858509316994e-4;
const A1512: Float = 3.82571090835658412954920192323e-4;
const A1513: Float = -3.40465008687404560802977114492e-4;
const A1514: Float = 1.41312443674632500278074618366e-1;

const A161: Float = -4.28896301583791923408573538692e-1;
const A166: Float = -4.69762141536116384314449447206e0;
const A167: Float = 7.68342119606259904184240953878e0;
const A168: Float = 4.06898981839711007970213554331e0;
const A169: Float = 3.56727187455281109270669543021e-1;
const A1613: Float = -1.39902416515901462129418009734e-3;
const A1614: Float = 2.9475147891527723389556272149e0;
const A1615: Float = -9.15095847217987001081870187138e0;

const D41: Float = -0.84289382761090128651353491142e+01;
const D46: Float = 0.56671495351937776962531783590e+00;
const D47: Float = -0.30689499459498916912797304727e+01;
const D48: Float = 0.23846676565120698287728149680e+01;
const D49: Float = 0.21170345824450282767155149946e+01;
const D410: Float = -0.87139158377797299206789907490e+00;
const D411: Float = 0.22404374302607882758541771650e+01;
const D412: Float = 0.63157877876946881815570249290e+00;
const D413: Float = -0.88990336451333310820698117400e-01;
const D414: Float = 0.18148505520854727256656404962e+02;
const D415: Float = -0.91946323924783554000451984436e+01;
const D416: Float = -0.44360363875948939664310572000e+01;

const D51: Float = 0.10427508642579134603413151009e+02;
const D56: Float = 0.24228349177525818288430175319e+03;
const D57: Float = 0.16520045171727028198505394887e+03;
const D58: Float = -0.37454675472269020279518312152e+03;
const D59: Float = -0.22113666853125306036270938578e+02;
const D510: Float = 0.77334326684722638389603898808e+01;
const D511: Float = -0.30674084731089398182061213626e+02;
const D512: Float = -0.93321305264302278729567221706e+01;
const D513: Float = 0.15697238121770843886131091075e+02;
const D514: Float = -0.31139403219565177677282850411e+02;
const D515: Float = -0.93529243588444783865713862664e+01;
const D516: Float = 0.35816841486394083752465898540e+02;

const D61: Float = 0.19985053242002433820987653617e+02;
const D66: Float = -0.38703730874935176555105901742e+03;
const D67: Float = -0.18917813819516756882830838328e+03;
const D68: Float = 0.52780815920542364900561016686e+03;
const D69: Float = -0.11573902539959630126141871134e+02;
const D610: Float = 0.68812326946963000169666922661e+01;
const D611: Float = -0.10006050966910838403183860980e+01;
const D612: Float = 0.77771377980534432092869265740e+00;
const D613: Float = -0.27782057523535084065932004339e+01;
const D614: Float = -0.60196695231264120758267380846e+02;
const D615: Float = 0.84320405506677161018159903784e+02;
const D616: Float = 0.11992291136182789328035130030e+02;

const D71: Float = -0.25693933462703749003312586129e+02;
const D76: Float = -0.15418974869023643374053993627e+03;
const D77: Float = -0.23152937917604549567536039109e+03;
const D78: Float = 0.35763911791061412378285349910e+03;
const D79: Float = 0.93405324183624310003907691704e+02;
const D710: Float = -0.37458323136451633156875139351e+02;
const D711: Float = 0.10409964950896230045147246184e+03;
const D712: Float = 0.29840293426660503123344363579e+02;
const D713: Float = -0.43533456590011143754432175058e+02;
const D714: Float = 0.96324553959188282948394950600e+02;
const D715: Float = -0.39177261675615439165231486172e+02;
const D716: Float = -0.14972683625798562581422125276e+03;
